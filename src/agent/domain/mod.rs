//! Domain model for Agent Card registration and discovery.
//!
//! Cards are validated on construction; discovery (filtering, sorting and
//! pagination) is a pure function over a snapshot of registered cards.

mod card;
mod discovery;
mod error;
mod ids;

pub use card::{AgentCard, AgentCardParts, AgentEndpoint, ProtocolVersion, SecurityScheme};
pub use discovery::{
    DiscoveryFilter, DiscoveryPage, DiscoveryQuery, PageRequest, SortDirection, SortField,
    SortOrder,
};
pub use error::{AgentDomainError, ParseSortFieldError};
pub use ids::AgentId;
