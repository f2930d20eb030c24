//! JSON-RPC 2.0 request and response envelopes.

use super::RpcError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Protocol version every envelope must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// Validated request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Request identifier; `None` marks a notification.
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Parameters; absent parameters become an empty object.
    pub params: Value,
}

impl RpcRequest {
    /// Validates a decoded JSON value as a request envelope.
    ///
    /// # Errors
    ///
    /// Returns the identifier to echo (or `null`) together with
    /// [`RpcError::InvalidRequest`] when the value is not a well-formed
    /// JSON-RPC 2.0 request.
    pub fn from_value(value: Value) -> Result<Self, (Value, RpcError)> {
        let Value::Object(mut fields) = value else {
            return Err((
                Value::Null,
                RpcError::invalid_request("request must be an object"),
            ));
        };

        let id = match fields.remove("id") {
            None => None,
            Some(id @ (Value::String(_) | Value::Number(_) | Value::Null)) => Some(id),
            Some(_) => {
                return Err((
                    Value::Null,
                    RpcError::invalid_request("id must be a string, number or null"),
                ));
            }
        };
        let echo = id.clone().unwrap_or(Value::Null);

        if fields.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err((echo, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
        }

        let method = match fields.remove("method") {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => {
                return Err((
                    echo,
                    RpcError::invalid_request("method must be a non-empty string"),
                ));
            }
        };

        let params = match fields.remove("params") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(params @ (Value::Object(_) | Value::Array(_))) => params,
            Some(_) => {
                return Err((
                    echo,
                    RpcError::invalid_request("params must be an object or array"),
                ));
            }
        };

        Ok(Self { id, method, params })
    }

    /// Returns whether the request expects no response.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Short human-readable description.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcErrorObject>,
    id: Value,
}

impl RpcResponse {
    /// Creates a success response.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn failure(id: Value, error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(error.to_object()),
            id,
        }
    }

    /// Returns the result member, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the error member, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&RpcErrorObject> {
        self.error.as_ref()
    }

    /// Returns the echoed identifier.
    #[must_use]
    pub const fn id(&self) -> &Value {
        &self.id
    }
}
