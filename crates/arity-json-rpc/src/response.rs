use serde_json::{Value, json};

use crate::error::{RpcErrorObject, default_message, error_codes};

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Result(Value),
    Error(RpcErrorObject),
}

/// Outcome of one call, ready to render.
///
/// Result and error are mutually exclusive; setting one discards the other.
/// A response that never received either renders a null result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcResponse {
    id: Option<String>,
    outcome: Option<Outcome>,
}

impl RpcResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_result(&mut self, result: Value) {
        self.outcome = Some(Outcome::Result(result));
    }

    pub fn set_error(&mut self, error: RpcErrorObject) {
        self.outcome = Some(Outcome::Error(error));
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Some(Outcome::Result(value)) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RpcErrorObject> {
        match &self.outcome {
            Some(Outcome::Error(error)) => Some(error),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Error(_)))
    }

    /// Strip internals from an error before it leaves the process: detail is
    /// always dropped, and a generic internal error loses its message too.
    /// Application-coded faults keep their code and message. Idempotent, and
    /// a no-op on non-error responses. Must run before [`RpcResponse::render`].
    pub fn sanitize_error(&mut self) {
        if let Some(Outcome::Error(error)) = &mut self.outcome {
            error.data = None;
            if error.code == error_codes::INTERNAL_ERROR {
                error.message = default_message(error.code).to_string();
            }
        }
    }

    fn to_value(&self) -> Value {
        let id = self
            .id
            .as_ref()
            .map_or(Value::Null, |id| Value::String(id.clone()));
        match &self.outcome {
            Some(Outcome::Error(error)) => json!({"id": id, "error": error}),
            Some(Outcome::Result(result)) => json!({"id": id, "result": result}),
            None => json!({"id": id, "result": Value::Null}),
        }
    }

    /// Serialize to JSON text; pretty mode indents for human debugging.
    pub fn render(&self, pretty: bool) -> String {
        let value = self.to_value();
        if pretty {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }
}
