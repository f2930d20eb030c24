//! Error types for channel names and subscription patterns.

use thiserror::Error;

/// Errors returned while constructing channel values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelDomainError {
    /// The channel name is not a dot-delimited sequence of literal segments.
    #[error("invalid channel name '{name}': {reason}")]
    InvalidName {
        /// Rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// The subscription pattern cannot be parsed.
    #[error("invalid channel pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Rejected pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: &'static str,
    },
}

impl ChannelDomainError {
    pub(crate) fn name(name: &str, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.to_owned(),
            reason,
        }
    }

    pub(crate) fn pattern(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_owned(),
            reason,
        }
    }
}
