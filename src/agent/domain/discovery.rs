//! Filtering, ordering and pagination of registered Agent Cards.

use super::{AgentCard, ParseSortFieldError, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Criteria an Agent Card must satisfy to appear in a discovery page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFilter {
    /// Capability tags that must all be declared by the card.
    pub capabilities: Vec<String>,
    /// Exact protocol version the card must announce.
    pub protocol_version: Option<ProtocolVersion>,
}

impl DiscoveryFilter {
    /// Returns whether `card` satisfies every populated criterion.
    #[must_use]
    pub fn matches(&self, card: &AgentCard) -> bool {
        let version_matches = self
            .protocol_version
            .as_ref()
            .is_none_or(|wanted| card.protocol_version() == wanted);
        version_matches && card.has_capabilities(&self.capabilities)
    }
}

/// Agent Card field used to order discovery results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Time of the most recent registration.
    #[default]
    RegisteredAt,
    /// Human-readable name.
    Name,
    /// Agent identifier.
    Id,
    /// Agent implementation version.
    Version,
}

impl SortField {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisteredAt => "registered_at",
            Self::Name => "name",
            Self::Id => "id",
            Self::Version => "version",
        }
    }

    fn compare(self, left: &AgentCard, right: &AgentCard) -> Ordering {
        match self {
            Self::RegisteredAt => left.registered_at().cmp(&right.registered_at()),
            Self::Name => left.name().cmp(right.name()),
            Self::Id => left.id().cmp(right.id()),
            Self::Version => left.version().cmp(right.version()),
        }
    }
}

impl TryFrom<&str> for SortField {
    type Error = ParseSortFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "registered_at" => Ok(Self::RegisteredAt),
            "name" => Ok(Self::Name),
            "id" => Ok(Self::Id),
            "version" => Ok(Self::Version),
            _ => Err(ParseSortFieldError(value.to_owned())),
        }
    }
}

/// Direction applied to the sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// Ordering of discovery results.
///
/// Defaults to most recently registered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    /// Field to sort by.
    pub field: SortField,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Orders two cards, breaking ties by ascending identifier so that pages
    /// are stable across calls.
    fn compare(self, left: &AgentCard, right: &AgentCard) -> Ordering {
        let primary = match self.direction {
            SortDirection::Asc => self.field.compare(left, right),
            SortDirection::Desc => self.field.compare(right, left),
        };
        primary.then_with(|| left.id().cmp(right.id()))
    }
}

/// Offset/limit window over the sorted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of matching cards to skip.
    pub offset: usize,
    /// Maximum number of cards to return.
    pub limit: usize,
}

impl PageRequest {
    /// Creates a page window.
    #[must_use]
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Complete discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
    /// Matching criteria.
    pub filter: DiscoveryFilter,
    /// Result ordering.
    pub sort: SortOrder,
    /// Page window.
    pub page: PageRequest,
}

impl DiscoveryQuery {
    /// Applies the query to a snapshot of registered cards.
    ///
    /// An offset beyond the number of matches yields an empty page rather
    /// than an error.
    #[must_use]
    pub fn apply(&self, cards: Vec<AgentCard>) -> DiscoveryPage {
        let mut matching: Vec<AgentCard> = cards
            .into_iter()
            .filter(|card| self.filter.matches(card))
            .collect();
        matching.sort_by(|left, right| self.sort.compare(left, right));

        let total = matching.len();
        let agents = matching
            .into_iter()
            .skip(self.page.offset)
            .take(self.page.limit)
            .collect();

        DiscoveryPage {
            agents,
            total,
            offset: self.page.offset,
            limit: self.page.limit,
        }
    }
}

/// One page of discovery results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPage {
    /// Cards in the requested window.
    pub agents: Vec<AgentCard>,
    /// Number of cards matching the filter across all pages.
    pub total: usize,
    /// Offset that produced this page.
    pub offset: usize,
    /// Limit that produced this page.
    pub limit: usize,
}
