use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved global method marking a step boundary.
pub const DELAY: &str = "delay";
/// Reserved global method naming the object to present.
pub const SET_ROOT: &str = "setRoot";
/// Removes the addressed object from the registry.
pub const DESTROY: &str = "destroy";

/// One instruction in a trace stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Target registry key; `None` for global operations.
    pub key: Option<String>,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Command {
    pub fn new(key: Option<&str>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            key: key.map(str::to_string),
            method: method.into(),
            args,
        }
    }

    /// Instance or constructor command addressed to `key`.
    pub fn keyed(key: &str, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(Some(key), method, args)
    }

    pub fn global(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(None, method, args)
    }

    pub fn delay(line: u32) -> Self {
        Self::global(DELAY, vec![Value::from(line)])
    }

    pub fn set_root(key: &str) -> Self {
        Self::global(SET_ROOT, vec![Value::from(key)])
    }

    pub fn is_delay(&self) -> bool {
        self.key.is_none() && self.method == DELAY
    }

    /// Line number carried by a step delimiter, if it has one.
    pub fn delay_line(&self) -> Option<u32> {
        if !self.is_delay() {
            return None;
        }
        self.args
            .first()
            .and_then(Value::as_u64)
            .and_then(|line| u32::try_from(line).ok())
    }
}

/// Parse a JSON command array as produced by a trace backend.
pub fn parse_commands(raw: &str) -> Result<Vec<Command>, serde_json::Error> {
    serde_json::from_str(raw)
}
