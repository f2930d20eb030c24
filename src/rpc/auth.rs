//! Caller identity and the authorization port.

use crate::agent::domain::AgentId;
use async_trait::async_trait;
use thiserror::Error;

/// Identity of the agent issuing a request.
///
/// Credentials are verified upstream by the authenticating proxy, which
/// forwards the verified agent identifier. A missing or blank identifier
/// yields an anonymous caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    caller: Option<AgentId>,
}

impl CallerContext {
    /// Creates an anonymous caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { caller: None }
    }

    /// Creates a caller identified as `agent`.
    #[must_use]
    pub const fn agent(agent: AgentId) -> Self {
        Self {
            caller: Some(agent),
        }
    }

    /// Builds a caller from a forwarded identity header value.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        Self {
            caller: value.and_then(|raw| AgentId::new(raw).ok()),
        }
    }

    /// Returns the verified caller identifier, if any.
    #[must_use]
    pub const fn caller(&self) -> Option<&AgentId> {
        self.caller.as_ref()
    }
}

/// Reason an authorizer refused a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AuthorizationDenied(pub String);

/// Decides whether a caller may invoke a method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Authorizes `caller` to invoke `method`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationDenied`] when the caller may not invoke the
    /// method.
    async fn authorize(
        &self,
        caller: &CallerContext,
        method: &str,
    ) -> Result<(), AuthorizationDenied>;
}

/// Authorizer that admits every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(
        &self,
        _caller: &CallerContext,
        _method: &str,
    ) -> Result<(), AuthorizationDenied> {
        Ok(())
    }
}
