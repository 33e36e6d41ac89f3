/*
[INPUT]:  HTTP status and decoded JSON body from the transport
[OUTPUT]: ApiResponse envelope with payload accessors
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the response envelope changes
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::Result;

/// Raw response of one HTTP call.
///
/// The status is not interpreted: a 4xx/5xx reply is still an `ApiResponse`, and
/// business failures have to be read from the payload (`success`, `message`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether the HTTP status was 2xx
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The payload's own `success` flag, if present
    pub fn success(&self) -> Option<bool> {
        self.body.get("success").and_then(Value::as_bool)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    pub fn result(&self) -> Option<&Value> {
        self.body.get("result")
    }

    /// Decode the `result` field into `T`
    pub fn parse_result<T: DeserializeOwned>(&self) -> Result<T> {
        let result = self.result().cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(result)?)
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}
