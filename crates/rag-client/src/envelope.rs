//! Server response envelope handling
//!
//! Every REST endpoint answers with `{result, data, err?, count?}`, except a
//! few (the refresh-token endpoint among them) that return the payload bare.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Envelope returned by bulk operations that may partially fail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResponse<T> {
    pub result: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
}

/// Envelope returned by paginated listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResponse<T> {
    /// Absent on listings that answer `{count, data}` directly
    #[serde(default)]
    pub result: String,
    pub data: Vec<T>,
    pub count: u64,
}

/// Envelope returned by bulk operations that only report how many rows changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub result: String,
    pub count: u64,
}

/// Error body the server sends with failed requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ErrorBody {
    /// Build an `Error::Api` from a failed response body
    pub fn into_error(self, status: u16) -> Error {
        Error::Api {
            status,
            error_code: self.error_code,
            message: self.message.unwrap_or_else(|| "Server Error".to_string()),
        }
    }
}

/// Unwrap a response into the payload the caller asked for.
///
/// `{result: "success", data}` yields `data`; a success envelope carrying `err`
/// or `count` is returned whole so bulk and paginated callers see those fields.
/// Bodies without a `result` key pass through untouched.
pub fn check_response(status: u16, body: Value) -> Result<Value> {
    if !(200..400).contains(&status) {
        let parsed: ErrorBody = serde_json::from_value(body).unwrap_or_default();
        return Err(parsed.into_error(status));
    }

    if body.is_null() {
        return Err(Error::Api {
            status,
            error_code: None,
            message: "Server Error".to_string(),
        });
    }

    let Some(result) = body.get("result") else {
        return Ok(body);
    };

    if result.as_str() != Some("success") {
        return Err(Error::Rejected { body });
    }

    if body.get("err").is_some() || body.get("count").is_some() {
        return Ok(body);
    }

    match body {
        Value::Object(mut map) => Ok(map.remove("data").unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

/// Drop top-level null fields from a request payload
pub fn strip_nulls(data: &mut Value) {
    if let Value::Object(map) = data {
        map.retain(|_, v| !v.is_null());
    }
}
