//! # Signature-Keyed JSON-RPC Dispatch
//!
//! A transport-agnostic JSON-RPC dispatch engine: methods register under a
//! signature key (name plus arity, or a structured-object marker), inbound
//! calls normalize from an envelope and/or flat parameters, and the
//! dispatcher coerces raw parameter text into declared native types before
//! invoking. Nothing in this crate performs I/O or suspends.
//!
//! ## Features
//! - Declarative unit registration, static or instance-bound, with singleton
//!   or per-call instance lifetime
//! - Envelope-over-flat request normalization with documented precedence
//! - Built-in introspection listing under a reserved method name
//! - Sanitizable error envelopes, pretty rendering, JSONP wrapping
//! - Lifecycle hook points for transport-level observers

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod jsonp;
pub mod registry;
pub mod request;
pub mod response;
pub mod signature;
pub mod types;
pub mod unit;

// Re-export main types
pub use config::{RpcConfig, parse_unit_list};
pub use dispatch::Dispatcher;
pub use error::{RegistryError, RpcError, RpcErrorObject, default_message, error_codes};
pub use events::{LifecycleEvent, LifecycleObserver, LifecyclePhase};
pub use jsonp::wrap_jsonp;
pub use registry::{INTROSPECTION_METHOD, MethodRegistry, RegisteredMethod};
pub use request::{ENVELOPE_PARAMS, RequestParams, RpcRequest};
pub use response::RpcResponse;
pub use signature::{Arity, SignatureKey};
pub use types::{CallArgs, Fault, ParamType, ParamValue};
pub use unit::{UnitBuilder, UnitDef};
