use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::Fault;

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}

/// Generic message for a standard code, used when the real message must not
/// reach the caller.
pub fn default_message(code: i64) -> &'static str {
    match code {
        error_codes::PARSE_ERROR => "Parse error",
        error_codes::INVALID_REQUEST => "Invalid Request",
        error_codes::METHOD_NOT_FOUND => "Method not found",
        error_codes::INVALID_PARAMS => "Invalid params",
        error_codes::INTERNAL_ERROR => "Internal error",
        _ => "Server error",
    }
}

/// Error object carried by an error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Everything that can go wrong between a normalized request and a result.
///
/// [`RpcError::to_error_object`] always builds the fully detailed form;
/// stripping it down for callers is the response's job.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Envelope or parameter text was not valid JSON (-32700).
    #[error("JSON payload failed to parse: {reason}")]
    Parse { reason: String },

    /// No method name anywhere in the request and introspection disabled (-32600).
    #[error("No method specified.")]
    UnspecifiedMethod,

    /// No registered signature matched the name and parameter count (-32601).
    #[error("JSON-RPC method [{method}] with {param_count} parameters not found.")]
    MethodNotFound { method: String, param_count: usize },

    /// The bound callable (or the coercion in front of it) faulted.
    #[error(transparent)]
    Invocation(#[from] Fault),
}

impl RpcError {
    pub fn parse(reason: impl Into<String>) -> Self {
        RpcError::Parse {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse { .. } => error_codes::PARSE_ERROR,
            RpcError::UnspecifiedMethod => error_codes::INVALID_REQUEST,
            RpcError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            RpcError::Invocation(fault) => fault.code().unwrap_or(error_codes::INTERNAL_ERROR),
        }
    }

    /// Detailed error object: full message, fault detail attached when present.
    pub fn to_error_object(&self) -> RpcErrorObject {
        let mut object = RpcErrorObject::new(self.code(), self.to_string());
        if let RpcError::Invocation(fault) = self {
            if let Some(detail) = fault.detail() {
                object = object.with_data(detail.clone());
            }
        }
        object
    }
}

/// Startup-fatal registry construction errors.
///
/// Individual bad units or methods are logged and skipped; these two mean
/// there is nothing left to serve.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no RPC units configured")]
    NoUnits,

    #[error("no remotable methods found")]
    NoMethods,
}
