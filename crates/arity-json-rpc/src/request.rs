use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::RpcError;

/// Flat parameter names accepted as envelope carriers, in precedence order.
pub const ENVELOPE_PARAMS: [&str; 2] = ["json", "data"];

/// Parameter shape of a normalized request.
///
/// Positional parameters are kept as raw text; the declared signature decides
/// their types at dispatch time, so a JSON `2` and a JSON `"2"` both arrive
/// here as `"2"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestParams {
    #[default]
    None,
    Positional(Vec<String>),
    Structured(Map<String, Value>),
}

impl RequestParams {
    pub fn shape(&self) -> &'static str {
        match self {
            RequestParams::None => "none",
            RequestParams::Positional(_) => "positional",
            RequestParams::Structured(_) => "structured",
        }
    }
}

/// A normalized inbound call.
///
/// Either side of the request may be missing: the envelope supplies id,
/// method and params when present, flat parameters fill whatever it left
/// open. A request without a method is valid (introspection fallback).
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    id: Option<String>,
    method: Option<String>,
    params: RequestParams,
}

impl RpcRequest {
    pub fn new(id: Option<String>, method: Option<String>, params: RequestParams) -> Self {
        Self { id, method, params }
    }

    /// Pick the envelope text out of the flat parameters (`json` wins over `data`).
    pub fn envelope_param(flat: &HashMap<String, String>) -> Option<&str> {
        ENVELOPE_PARAMS
            .iter()
            .find_map(|name| flat.get(*name).map(String::as_str))
    }

    /// Normalize from the flat parameter map alone.
    pub fn from_flat(flat: &HashMap<String, String>) -> Result<Self, RpcError> {
        Self::normalize(Self::envelope_param(flat), flat)
    }

    /// Reconcile an optional JSON-RPC envelope with flat parameters.
    ///
    /// The envelope always wins for the fields it carries; flat `id`,
    /// `method` and `params` only fill gaps. A flat `params` value that
    /// parses to something other than an array or object leaves the shape
    /// unset; text that does not parse at all fails the whole normalization.
    pub fn normalize(
        envelope: Option<&str>,
        flat: &HashMap<String, String>,
    ) -> Result<Self, RpcError> {
        let mut id = None;
        let mut method = None;
        let mut params = RequestParams::None;

        if let Some(text) = envelope {
            let value: Value = serde_json::from_str(text)
                .map_err(|err| RpcError::parse(format!("envelope: {}", err)))?;
            let Value::Object(envelope) = value else {
                return Err(RpcError::parse("envelope: not a JSON object"));
            };
            id = match envelope.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            method = match envelope.get("method") {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            };
            if let Some(value) = envelope.get("params") {
                params = classify_params(value);
            }
        }

        if id.is_none() {
            id = flat.get("id").cloned();
        }
        if method.is_none() {
            method = flat.get("method").cloned();
        }
        if params == RequestParams::None {
            if let Some(text) = flat.get("params") {
                let value: Value = serde_json::from_str(text)
                    .map_err(|err| RpcError::parse(format!("params: {}", err)))?;
                params = classify_params(&value);
            }
        }

        Ok(Self { id, method, params })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Positional raw-text parameters; empty for other shapes.
    pub fn positional(&self) -> &[String] {
        match &self.params {
            RequestParams::Positional(values) => values,
            _ => &[],
        }
    }

    pub fn param_count(&self) -> usize {
        self.positional().len()
    }

    pub fn param_at(&self, index: usize) -> Option<&str> {
        self.positional().get(index).map(String::as_str)
    }

    /// The structured parameter, or an empty object for other shapes.
    pub fn structured_or_empty(&self) -> Map<String, Value> {
        match &self.params {
            RequestParams::Structured(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Array → positional raw text, object → structured, anything else → no shape.
fn classify_params(value: &Value) -> RequestParams {
    match value {
        Value::Array(items) => {
            RequestParams::Positional(items.iter().map(raw_text).collect())
        }
        Value::Object(map) => RequestParams::Structured(map.clone()),
        _ => RequestParams::None,
    }
}

/// Raw-text form of one positional element: string content as-is, compact
/// JSON for everything else.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_envelope_full() {
        let req = RpcRequest::normalize(
            Some(r#"{"id":"1","method":"add","params":[2, 3]}"#),
            &flat(&[]),
        )
        .unwrap();
        assert_eq!(req.id(), Some("1"));
        assert_eq!(req.method(), Some("add"));
        assert_eq!(req.positional(), ["2", "3"]);
    }

    #[test]
    fn test_envelope_number_id() {
        let req =
            RpcRequest::normalize(Some(r#"{"id":7,"method":"noop"}"#), &flat(&[])).unwrap();
        assert_eq!(req.id(), Some("7"));
    }

    #[test]
    fn test_envelope_wins_over_flat() {
        let req = RpcRequest::normalize(
            Some(r#"{"id":"env","method":"add"}"#),
            &flat(&[("id", "flat"), ("method", "sub"), ("params", "[1]")]),
        )
        .unwrap();
        assert_eq!(req.id(), Some("env"));
        assert_eq!(req.method(), Some("add"));
        // envelope set no shape, so the flat params still apply
        assert_eq!(req.positional(), ["1"]);
    }

    #[test]
    fn test_flat_fallbacks() {
        let req = RpcRequest::from_flat(&flat(&[
            ("id", "9"),
            ("method", "echo"),
            ("params", r#"["hello"]"#),
        ]))
        .unwrap();
        assert_eq!(req.id(), Some("9"));
        assert_eq!(req.method(), Some("echo"));
        assert_eq!(req.positional(), ["hello"]);
    }

    #[test]
    fn test_envelope_param_precedence() {
        let map = flat(&[("data", "{}"), ("json", r#"{"method":"a"}"#)]);
        assert_eq!(RpcRequest::envelope_param(&map), Some(r#"{"method":"a"}"#));
    }

    #[test]
    fn test_flat_structured_params() {
        let req = RpcRequest::from_flat(&flat(&[
            ("method", "store"),
            ("params", r#"{"key":"k","value":42}"#),
        ]))
        .unwrap();
        assert_eq!(req.params().shape(), "structured");
        assert_eq!(req.structured_or_empty().get("value"), Some(&42.into()));
    }

    #[test]
    fn test_scalar_params_leave_shape_unset() {
        let req =
            RpcRequest::from_flat(&flat(&[("method", "noop"), ("params", "5")])).unwrap();
        assert_eq!(req.params(), &RequestParams::None);
        assert_eq!(req.param_count(), 0);
    }

    #[test]
    fn test_malformed_params_fail() {
        let err =
            RpcRequest::from_flat(&flat(&[("method", "noop"), ("params", "[1,")])).unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_malformed_envelope_fails() {
        let err = RpcRequest::normalize(Some("not-json"), &flat(&[])).unwrap_err();
        assert_eq!(err.code(), -32700);

        let err = RpcRequest::normalize(Some("[1,2]"), &flat(&[])).unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_envelope_empty_array_suppresses_flat_params() {
        let req = RpcRequest::normalize(
            Some(r#"{"method":"noop","params":[]}"#),
            &flat(&[("params", "[1,2]")]),
        )
        .unwrap();
        assert_eq!(req.params(), &RequestParams::Positional(vec![]));
    }

    #[test]
    fn test_positional_raw_text() {
        let req = RpcRequest::from_flat(&flat(&[
            ("method", "mix"),
            ("params", r#"["plain", 2, true, null, [1,2]]"#),
        ]))
        .unwrap();
        assert_eq!(req.positional(), ["plain", "2", "true", "null", "[1,2]"]);
    }

    #[test]
    fn test_missing_method_is_not_an_error() {
        let req = RpcRequest::from_flat(&flat(&[("id", "1")])).unwrap();
        assert_eq!(req.method(), None);
        assert_eq!(req.id(), Some("1"));
    }
}
