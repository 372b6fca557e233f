//! # HTTP RPC Server
//!
//! This crate provides HTTP transport for the signature-keyed JSON-RPC
//! dispatcher. It serves GET and POST requests on a single endpoint,
//! collecting parameters from the query string, form-encoded bodies and
//! JSON envelopes, and always answers with a JSON-RPC response document.
//!
//! ## Features
//! - Flat-parameter and enveloped requests on the same endpoint
//! - Pretty-printed responses via the `debug` parameter
//! - JSONP wrapping via the `callback` parameter
//! - Lifecycle observer hooks around request processing

pub mod handler;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use handler::RpcHttpHandler;
pub use server::{RpcHttpServer, RpcHttpServerBuilder, ServerConfig};

// Re-export foundational types
pub use arity_json_rpc::{
    Dispatcher, LifecycleEvent, LifecycleObserver, LifecyclePhase, MethodRegistry, RegistryError,
    RpcConfig, RpcRequest, RpcResponse, UnitBuilder, UnitDef,
};

/// Result type for HTTP RPC operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// HTTP transport specific errors
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("registry error: {0}")]
    Registry(#[from] arity_json_rpc::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
