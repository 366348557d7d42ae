//! Typed access to command arguments.

use serde_json::Value;

use crate::protocol::TraceError;

/// Positional arguments of one command, tagged with the method name for
/// error reporting. Missing and `null` arguments both read as absent.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    method: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(method: &'a str, values: &'a [Value]) -> Self {
        Self { method, values }
    }

    pub fn method(&self) -> &'a str {
        self.method
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument, `None` when missing or null.
    pub fn get(&self, i: usize) -> Option<&'a Value> {
        self.values.get(i).filter(|v| !v.is_null())
    }

    /// Raw argument including an explicit null.
    pub fn raw(&self, i: usize) -> Option<&'a Value> {
        self.values.get(i)
    }

    pub fn rest(&self, from: usize) -> &'a [Value] {
        self.values.get(from..).unwrap_or(&[])
    }

    fn error(&self, message: impl Into<String>) -> TraceError {
        TraceError::argument(self.method, message)
    }

    pub fn int(&self, i: usize) -> Result<i64, TraceError> {
        self.opt_int(i)?
            .ok_or_else(|| self.error(format!("argument {i} is required")))
    }

    pub fn opt_int(&self, i: usize) -> Result<Option<i64>, TraceError> {
        let Some(value) = self.get(i) else {
            return Ok(None);
        };
        if let Some(n) = value.as_i64() {
            return Ok(Some(n));
        }
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9e15 => Ok(Some(f as i64)),
            _ => Err(self.error(format!("argument {i} must be an integer, got {value}"))),
        }
    }

    /// A non-negative position into tracer state.
    pub fn index(&self, i: usize) -> Result<usize, TraceError> {
        let n = self.int(i)?;
        usize::try_from(n).map_err(|_| TraceError::index(format!("{}: index {n} is negative", self.method)))
    }

    pub fn opt_index(&self, i: usize) -> Result<Option<usize>, TraceError> {
        match self.opt_int(i)? {
            None => Ok(None),
            Some(n) => usize::try_from(n)
                .map(Some)
                .map_err(|_| TraceError::index(format!("{}: index {n} is negative", self.method))),
        }
    }

    pub fn opt_f64(&self, i: usize) -> Result<Option<f64>, TraceError> {
        match self.get(i) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.error(format!("argument {i} must be a number, got {value}"))),
        }
    }

    /// Flag argument with a default; non-boolean values use truthiness.
    pub fn flag(&self, i: usize, default: bool) -> bool {
        match self.raw(i) {
            None => default,
            Some(value) => is_truthy(value),
        }
    }

    pub fn str(&self, i: usize) -> Result<&'a str, TraceError> {
        self.get(i)
            .and_then(Value::as_str)
            .ok_or_else(|| self.error(format!("argument {i} must be a string")))
    }

    /// Key argument; empty or absent unbinds.
    pub fn opt_key(&self, i: usize) -> Option<String> {
        self.get(i)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn array(&self, i: usize) -> Result<Option<&'a Vec<Value>>, TraceError> {
        match self.get(i) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(self.error(format!("argument {i} must be an array, got {other}"))),
        }
    }
}

/// Truthiness of a traced value: zero, empty strings, false and null are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
