//! Best-effort response body resolution.
//!
//! One uncooperative request must never fail the whole capture: every fetch
//! is independent, a failure is logged with the record's method/URL, and the
//! record's body stays empty.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::correlate::CorrelatedRequest;
use crate::event::RequestId;

/// Why one response body could not be fetched.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The browser never captured a body for this request (redirects,
    /// cancelled loads, evicted buffers). Common, and quietly tolerated.
    #[error("no body captured for request")]
    NoBody,
    #[error("body fetch timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors draining the instrumentation buffer itself.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The browser handle is gone; fatal to the whole session.
    #[error("browser session lost: {0}")]
    SessionLost(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TraceError {
    /// Session loss aborts the orchestration; everything else is scoped to
    /// the current run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TraceError::SessionLost(_))
    }
}

/// RPC-style fetch of a captured response body, keyed by request id.
#[async_trait]
pub trait BodySource: Send {
    async fn response_body(&mut self, id: &RequestId) -> Result<Value, BodyError>;
}

/// The full browser-collaborator contract for the trace strategy: drain the
/// performance-log buffer, plus body fetches.
#[async_trait]
pub trait TraceSource: BodySource {
    /// Drain and return the raw performance-log records accumulated since
    /// the last call, in emission order.
    async fn performance_events(&mut self) -> Result<Vec<Value>, TraceError>;
}

/// Attempt a body fetch for every record, isolating per-request failures.
pub async fn resolve_bodies<S>(source: &mut S, records: &mut [CorrelatedRequest])
where
    S: BodySource + ?Sized,
{
    for record in records.iter_mut() {
        match source.response_body(&record.id).await {
            Ok(body) => record.response_body = Some(body),
            Err(BodyError::NoBody) => {
                debug!(
                    target: "trace.resolve",
                    method = %record.method,
                    url = %record.url,
                    "no response body captured"
                );
            }
            Err(err) => {
                warn!(
                    target: "trace.resolve",
                    method = %record.method,
                    url = %record.url,
                    error = %err,
                    "response body unavailable; emitting entry with empty body"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::correlate;
    use crate::event::decode_events;
    use serde_json::json;

    struct ScriptedBodies {
        fail_ids: Vec<&'static str>,
    }

    #[async_trait]
    impl BodySource for ScriptedBodies {
        async fn response_body(&mut self, id: &RequestId) -> Result<Value, BodyError> {
            if self.fail_ids.contains(&id.as_str()) {
                Err(BodyError::Timeout)
            } else {
                Ok(json!({"text": format!("body-{id}")}))
            }
        }
    }

    fn request(id: &str) -> Value {
        json!({
            "method": "Network.requestWillBeSent",
            "params": {
                "requestId": id,
                "request": {"method": "GET", "url": format!("https://example.com/{id}"), "headers": {}}
            }
        })
    }

    #[tokio::test]
    async fn one_failing_fetch_never_aborts_the_batch() {
        let records = vec![request("1"), request("2"), request("3")];
        let mut requests = correlate(decode_events(&records));
        let mut source = ScriptedBodies { fail_ids: vec!["2"] };

        resolve_bodies(&mut source, &mut requests).await;

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].response_body, Some(json!({"text": "body-1"})));
        assert_eq!(requests[1].response_body, None);
        assert_eq!(requests[2].response_body, Some(json!({"text": "body-3"})));
    }

    #[tokio::test]
    async fn missing_bodies_are_tolerated_quietly() {
        let mut requests = correlate(decode_events(&[request("1")]));
        struct NeverCaptured;
        #[async_trait]
        impl BodySource for NeverCaptured {
            async fn response_body(&mut self, _id: &RequestId) -> Result<Value, BodyError> {
                Err(BodyError::NoBody)
            }
        }
        resolve_bodies(&mut NeverCaptured, &mut requests).await;
        assert_eq!(requests[0].response_body, None);
    }
}
