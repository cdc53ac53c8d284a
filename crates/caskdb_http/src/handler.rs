//! Request handlers mapping HTTP semantics onto engine calls.

use crate::error::{ServerError, ServerResult};
use caskdb_core::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The value type requested by a `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    /// Textual value (the default).
    #[default]
    String,
    /// 64-bit signed integer value.
    Int64,
}

impl ValueType {
    /// Parses the `type` query parameter; anything but `int64` reads as a
    /// string, matching the engine's informational treatment of type tags.
    #[must_use]
    pub fn parse(value_type: Option<&str>) -> Self {
        match value_type {
            Some("int64") => Self::Int64,
            _ => Self::String,
        }
    }

    /// The wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "int64",
        }
    }
}

/// JSON body of a `POST /db/{key}` request.
#[derive(Debug, Deserialize)]
struct PutBody {
    value: serde_json::Value,
}

/// JSON body of a `GET /db/{key}` response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GetResponse {
    /// The requested key.
    pub key: String,
    /// The value type the response was read as.
    #[serde(rename = "type")]
    pub value_type: String,
    /// The value: a JSON number for `int64`, a JSON string otherwise.
    pub value: serde_json::Value,
}

/// Maps requests onto a shared [`Store`].
pub struct RequestHandler {
    store: Arc<Store>,
}

impl RequestHandler {
    /// Creates a handler over a shared store.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Handles `GET /db/{key}?type=...`.
    ///
    /// # Errors
    ///
    /// Engine errors pass through; see [`ServerError::status`] for the
    /// HTTP mapping.
    pub fn handle_get(&self, key: &str, value_type: ValueType) -> ServerResult<GetResponse> {
        let value = match value_type {
            ValueType::Int64 => serde_json::Value::from(self.store.get_int64(key)?),
            ValueType::String => serde_json::Value::from(self.store.get(key)?),
        };
        Ok(GetResponse {
            key: key.to_string(),
            value_type: value_type.as_str().to_string(),
            value,
        })
    }

    /// Handles `POST /db/{key}` with body `{"value": <string or integer>}`.
    ///
    /// Integer values route to `put_int64`, strings to `put`; anything else
    /// is a bad request.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for malformed bodies and passes engine errors
    /// through.
    pub fn handle_put(&self, key: &str, body: &[u8]) -> ServerResult<()> {
        let body: PutBody = serde_json::from_slice(body)
            .map_err(|err| ServerError::bad_request(format!("invalid JSON body: {err}")))?;

        match body.value {
            serde_json::Value::Number(number) => {
                let Some(n) = number.as_i64() else {
                    return Err(ServerError::bad_request(
                        "numeric value is not a 64-bit signed integer",
                    ));
                };
                self.store.put_int64(key, n)?;
            }
            serde_json::Value::String(s) => {
                self.store.put(key, &s)?;
            }
            other => {
                return Err(ServerError::bad_request(format!(
                    "value must be a string or integer, got {other}"
                )));
            }
        }
        Ok(())
    }
}
