use serde_json::{Map, Value};
use thiserror::Error;

/// Parameter types a remotable method may declare.
///
/// Anything outside this set makes the method ineligible for registration;
/// [`ParamType::Unsupported`] carries the declared name so the registry can
/// say what it skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Str,
    /// Single structured JSON object; forces the structured signature key.
    Object,
    Unsupported(&'static str),
}

impl ParamType {
    /// Type name as reported by the introspection listing.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamType::Int => "int",
            ParamType::Long => "long",
            ParamType::Float => "float",
            ParamType::Double => "double",
            ParamType::Bool => "boolean",
            ParamType::Str => "string",
            ParamType::Object => "object",
            ParamType::Unsupported(name) => name,
        }
    }

    pub fn is_remotable(&self) -> bool {
        !matches!(self, ParamType::Unsupported(_))
    }
}

/// A coerced runtime argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Str(String),
    Object(Map<String, Value>),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Long(_) => "long",
            ParamValue::Float(_) => "float",
            ParamValue::Double(_) => "double",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Str(_) => "string",
            ParamValue::Object(_) => "object",
        }
    }
}

/// Ordered argument list handed to every bound callable.
///
/// The dispatcher coerces raw parameter text against the declared signature
/// before building this, so the typed accessors only fail when a callable
/// reads a slot inconsistently with its own declaration.
#[derive(Debug, Clone, Default)]
pub struct CallArgs(Vec<ParamValue>);

impl CallArgs {
    pub fn new(values: Vec<ParamValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.0.get(index)
    }

    fn slot(&self, index: usize, expected: &'static str) -> Result<&ParamValue, Fault> {
        self.0.get(index).ok_or_else(|| {
            Fault::new(format!("missing {} argument at position {}", expected, index))
        })
    }

    fn mismatch(index: usize, expected: &'static str, actual: &ParamValue) -> Fault {
        Fault::new(format!(
            "argument {} is {}, expected {}",
            index,
            actual.kind(),
            expected
        ))
    }

    pub fn int(&self, index: usize) -> Result<i32, Fault> {
        match self.slot(index, "int")? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(index, "int", other)),
        }
    }

    pub fn long(&self, index: usize) -> Result<i64, Fault> {
        match self.slot(index, "long")? {
            ParamValue::Long(v) => Ok(*v),
            other => Err(Self::mismatch(index, "long", other)),
        }
    }

    pub fn float(&self, index: usize) -> Result<f32, Fault> {
        match self.slot(index, "float")? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(Self::mismatch(index, "float", other)),
        }
    }

    pub fn double(&self, index: usize) -> Result<f64, Fault> {
        match self.slot(index, "double")? {
            ParamValue::Double(v) => Ok(*v),
            other => Err(Self::mismatch(index, "double", other)),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, Fault> {
        match self.slot(index, "boolean")? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(index, "boolean", other)),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, Fault> {
        match self.slot(index, "string")? {
            ParamValue::Str(v) => Ok(v.as_str()),
            other => Err(Self::mismatch(index, "string", other)),
        }
    }

    pub fn object(&self, index: usize) -> Result<&Map<String, Value>, Fault> {
        match self.slot(index, "object")? {
            ParamValue::Object(v) => Ok(v),
            other => Err(Self::mismatch(index, "object", other)),
        }
    }
}

impl From<Vec<ParamValue>> for CallArgs {
    fn from(values: Vec<ParamValue>) -> Self {
        Self::new(values)
    }
}

/// Uniform fault a callable returns instead of a result.
///
/// Without an application code the fault surfaces as a generic internal
/// error (-32603); with one, that code and message reach the caller even
/// when detailed errors are disabled.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Fault {
    code: Option<i64>,
    message: String,
    detail: Option<Value>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn coded(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn code(&self) -> Option<i64> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }
}

impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        Fault::new(err.to_string())
    }
}
