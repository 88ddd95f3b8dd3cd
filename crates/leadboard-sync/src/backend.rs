//! The external store a [`Dashboard`](crate::Dashboard) reads from and saves to.

use async_trait::async_trait;
use leadboard_core::{RawRow, SaveAck, SaveRequest};
use serde_json::Value;

use crate::SyncError;

/// A sheet-like source of lead rows that accepts per-lead saves.
#[async_trait]
pub trait LeadBackend: Send + Sync {
    /// Fetch every row in sheet order.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SyncError>;

    /// Persist one lead. A returned ack may still carry a failure status.
    async fn save(&self, request: &SaveRequest) -> Result<SaveAck, SyncError>;
}

/// Validate a fetch payload: it must be an array of objects.
///
/// An `{error, message}` object is the sheet script's failure shape and is
/// reported as [`SyncError::Remote`].
pub fn parse_rows(payload: Value) -> Result<Vec<RawRow>, SyncError> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map.into_iter().collect()),
                other => Err(SyncError::Shape(format!(
                    "row {i} is {}, expected an object",
                    kind(&other)
                ))),
            })
            .collect(),
        Value::Object(map) if map.contains_key("error") => {
            let text = |key: &str| match map.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::new(),
            };
            Err(SyncError::Remote {
                error: text("error"),
                message: text("message"),
            })
        }
        other => Err(SyncError::Shape(format!(
            "expected an array of rows, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
