//! Decoding of raw performance-log records.
//!
//! The browser hands us a buffer of JSON records. Each relevant record is a
//! devtools envelope `{"method": "...", "params": {...}}`; chromedriver
//! additionally wraps that envelope in a log entry whose `message` field is
//! a JSON *string* holding `{"message": {method, params}}`. Both shapes are
//! accepted. Reading is best-effort: one malformed record is skipped with a
//! trace, never an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Session-scoped opaque identifier correlating one request's lifecycle
/// events. Not globally unique across capture sessions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of instrumentation event kinds the compiler understands.
///
/// Anything else decodes to [`NetworkEvent::Ignored`] and is dropped by the
/// correlator, so filtering lives in one place instead of string matching
/// scattered through the pipeline.
#[derive(Debug, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum NetworkEvent {
    #[serde(rename = "Network.requestWillBeSent")]
    RequestWillBeSent(RequestWillBeSent),
    #[serde(rename = "Network.responseReceived")]
    ResponseReceived(ResponseReceived),
    #[serde(other)]
    Ignored,
}

/// Params of a request-initiated event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSent {
    pub request_id: RequestId,
    pub request: RequestData,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// The nested `request` object of a request-initiated event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub method: String,
    pub url: String,
    /// Wire shape is a single string-keyed map; widened to an ordered list
    /// at correlation time.
    #[serde(default)]
    pub headers: serde_json::Map<String, Value>,
    #[serde(default)]
    pub post_data: Option<String>,
}

/// Params of a response-received event. Only the pieces the correlator
/// annotates with; the body itself is fetched lazily by the resolver.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceived {
    pub request_id: RequestId,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Decode a drained batch of raw log records, in reader order.
///
/// Malformed records (non-JSON message payloads, missing fields) are
/// dropped individually; this function never fails for a single bad record.
pub fn decode_events(records: &[Value]) -> Vec<NetworkEvent> {
    records.iter().filter_map(decode_record).collect()
}

fn decode_record(record: &Value) -> Option<NetworkEvent> {
    let envelope = unwrap_envelope(record)?;
    match serde_json::from_value::<NetworkEvent>(envelope) {
        Ok(event) => Some(event),
        Err(err) => {
            debug!(target: "trace.event", error = %err, "dropping undecodable log record");
            None
        }
    }
}

/// Peel the chromedriver log-entry wrapping, if present.
fn unwrap_envelope(record: &Value) -> Option<Value> {
    if record.get("method").is_some() {
        return Some(record.clone());
    }
    let text = record.get("message")?.as_str()?;
    let outer: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(err) => {
            debug!(target: "trace.event", error = %err, "dropping non-JSON log message");
            return None;
        }
    };
    let inner = outer.get("message")?;
    inner.get("method").is_some().then(|| inner.clone())
}
