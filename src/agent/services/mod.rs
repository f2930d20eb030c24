//! Application services for Agent Card registration and discovery.

mod registry;

pub use registry::{
    AgentRegistryService, AgentRegistryServiceError, AgentRegistryServiceResult,
    DiscoverAgentsRequest, DiscoveryLimits, RegisterAgentRequest,
};
