//! JSON-RPC 2.0 method dispatch.
//!
//! [`MethodDispatcher`] turns a request body into calls on the agent
//! registry, the task ledger and the channel bridge. Each method validates
//! its params against a JSON Schema before any service is touched, and every
//! service error maps onto one error code (see [`codes`]).

mod auth;
mod dispatcher;
mod envelope;
mod error;
mod methods;
mod params;

pub use auth::{AllowAll, AuthorizationDenied, Authorizer, CallerContext};
pub use dispatcher::{MethodDispatcher, RpcReply};
pub use envelope::{JSONRPC_VERSION, RpcErrorObject, RpcRequest, RpcResponse};
pub use error::{RpcError, RpcResult, codes};
pub use methods::{Method, MethodRegistry, SchemaCompileError};

#[cfg(test)]
pub use auth::MockAuthorizer;

#[cfg(test)]
mod tests;
