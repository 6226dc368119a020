//! Response envelope returned by every backend call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackendError, BackendResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BackendResponse {
    pub fn new(status: u16, data: Option<Value>) -> Self {
        Self { status, data }
    }

    /// 200 response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self::new(200, Some(data))
    }

    /// 200 response wrapping `records` as `{"result": [...]}`.
    pub fn with_result(records: Vec<Value>) -> Self {
        Self::ok(serde_json::json!({ "result": records }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `data.result` array of a query response.
    pub fn result_records(&self) -> BackendResult<Vec<Value>> {
        match self.data.as_ref().and_then(|data| data.get("result")) {
            Some(Value::Array(records)) => Ok(records.clone()),
            Some(other) => Err(BackendError::decode(format!(
                "expected result array, found {}",
                json_kind(other)
            ))),
            None => Err(BackendError::decode("response has no result field")),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
