use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform outcome of every use case: `{success, message, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl CommandResult {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// A failed outcome with an empty data object.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with(message, Value::Object(Map::new()))
    }

    pub fn failure_with(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}
