//! Channel names and wildcard subscription patterns.

use super::ChannelDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = '.';

/// Case-sensitive, dot-delimited channel name such as `metrics.cpu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Creates a validated channel name.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelDomainError::InvalidName`] when the name is empty,
    /// has an empty segment, or contains a wildcard.
    pub fn new(value: impl Into<String>) -> Result<Self, ChannelDomainError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(ChannelDomainError::name(&raw, "name must not be empty"));
        }
        for segment in raw.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(ChannelDomainError::name(&raw, "segments must not be empty"));
            }
            if segment.contains('*') {
                return Err(ChannelDomainError::name(
                    &raw,
                    "wildcards are only allowed in patterns",
                ));
            }
            if segment.chars().any(char::is_whitespace) {
                return Err(ChannelDomainError::name(
                    &raw,
                    "segments must not contain whitespace",
                ));
            }
        }
        Ok(Self(raw))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the dot-delimited segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = ChannelDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.0
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PatternSegment {
    Literal(String),
    /// `*`: exactly one segment.
    Single,
    /// `**`: zero or more trailing segments. Only ever the last segment.
    Rest,
}

/// Subscription pattern over channel names.
///
/// `*` matches exactly one segment and a trailing `**` matches zero or more
/// remaining segments, so `metrics.*` matches `metrics.cpu` but not
/// `metrics.system.cpu`, while `metrics.**` matches both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl ChannelPattern {
    /// Parses a subscription pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelDomainError::InvalidPattern`] for empty patterns,
    /// empty segments, partial wildcards such as `cpu*`, or a `**` that is
    /// not the final segment.
    pub fn parse(value: impl Into<String>) -> Result<Self, ChannelDomainError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(ChannelDomainError::pattern(
                &raw,
                "pattern must not be empty",
            ));
        }

        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        let last = parts.len().saturating_sub(1);
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            let segment = match part {
                "" => {
                    return Err(ChannelDomainError::pattern(
                        &raw,
                        "segments must not be empty",
                    ));
                }
                "*" => PatternSegment::Single,
                "**" if index == last => PatternSegment::Rest,
                "**" => {
                    return Err(ChannelDomainError::pattern(
                        &raw,
                        "'**' is only allowed as the last segment",
                    ));
                }
                literal if literal.contains('*') => {
                    return Err(ChannelDomainError::pattern(
                        &raw,
                        "wildcards must span a whole segment",
                    ));
                }
                literal if literal.chars().any(char::is_whitespace) => {
                    return Err(ChannelDomainError::pattern(
                        &raw,
                        "segments must not contain whitespace",
                    ));
                }
                literal => PatternSegment::Literal(literal.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { raw, segments })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns whether `name` matches the pattern.
    #[must_use]
    pub fn matches(&self, name: &ChannelName) -> bool {
        let mut candidate = name.segments();
        for segment in &self.segments {
            match segment {
                PatternSegment::Rest => return true,
                PatternSegment::Single => {
                    if candidate.next().is_none() {
                        return false;
                    }
                }
                PatternSegment::Literal(literal) => {
                    if candidate.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        candidate.next().is_none()
    }
}

impl TryFrom<String> for ChannelPattern {
    type Error = ChannelDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ChannelPattern> for String {
    fn from(value: ChannelPattern) -> Self {
        value.raw
    }
}

impl fmt::Display for ChannelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
