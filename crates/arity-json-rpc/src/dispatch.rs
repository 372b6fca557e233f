use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::RpcError;
use crate::registry::MethodRegistry;
use crate::request::RpcRequest;
use crate::signature::SignatureKey;
use crate::types::{CallArgs, Fault, ParamType, ParamValue};

/// Resolves and invokes methods against a built registry.
///
/// Dispatch is synchronous: one call, one direct invocation, no suspension.
/// Many threads may dispatch through the same instance concurrently since
/// both the dispatcher and the registry are read-only.
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    expose_methods: bool,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>, expose_methods: bool) -> Self {
        Self {
            registry,
            expose_methods,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Resolve the request's signature, coerce its parameters and invoke.
    ///
    /// A request without a method becomes an introspection call when method
    /// exposure is on. The structured signature always resolves before any
    /// positional one for the same name, regardless of the request's own
    /// parameter shape.
    pub fn dispatch(&self, request: &RpcRequest) -> Result<Value, RpcError> {
        let Some(method) = request.method() else {
            return if self.expose_methods {
                debug!("no method supplied, serving introspection listing");
                Ok(self.registry.method_listing().clone())
            } else {
                Err(RpcError::UnspecifiedMethod)
            };
        };

        if let Some(entry) = self.registry.get(&SignatureKey::structured(method)) {
            debug!("dispatching [{}]", entry.key());
            let args = CallArgs::new(vec![ParamValue::Object(request.structured_or_empty())]);
            return entry.invoke(&args).map_err(RpcError::Invocation);
        }

        let param_count = request.param_count();
        let key = SignatureKey::positional(method, param_count);
        let Some(entry) = self.registry.get(&key) else {
            return Err(RpcError::MethodNotFound {
                method: method.to_string(),
                param_count,
            });
        };
        debug!("dispatching [{}]", entry.key());
        let args = coerce_positional(request.positional(), entry.params())?;
        entry.invoke(&args).map_err(RpcError::Invocation)
    }
}

fn coerce_positional(raw: &[String], types: &[ParamType]) -> Result<CallArgs, RpcError> {
    let mut values = Vec::with_capacity(types.len());
    for (index, (text, param)) in raw.iter().zip(types.iter()).enumerate() {
        values.push(coerce(text, *param, index).map_err(RpcError::Invocation)?);
    }
    Ok(CallArgs::new(values))
}

/// Coerce one raw-text parameter to its declared type.
fn coerce(text: &str, param: ParamType, index: usize) -> Result<ParamValue, Fault> {
    let fail = |expected: &str| {
        Fault::new(format!(
            "cannot convert parameter {} [{}] to {}",
            index, text, expected
        ))
    };
    match param {
        ParamType::Int => text
            .parse::<i32>()
            .map(ParamValue::Int)
            .map_err(|_| fail("int")),
        ParamType::Long => text
            .parse::<i64>()
            .map(ParamValue::Long)
            .map_err(|_| fail("long")),
        ParamType::Float => text
            .parse::<f32>()
            .map(ParamValue::Float)
            .map_err(|_| fail("float")),
        ParamType::Double => text
            .parse::<f64>()
            .map(ParamValue::Double)
            .map_err(|_| fail("double")),
        ParamType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Ok(ParamValue::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(ParamValue::Bool(false))
            } else {
                Err(fail("boolean"))
            }
        }
        ParamType::Str => Ok(ParamValue::Str(text.to_string())),
        // positional signatures never declare these
        ParamType::Object | ParamType::Unsupported(_) => Err(fail(param.type_name())),
    }
}
