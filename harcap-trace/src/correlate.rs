//! Grouping of network events into one working record per request id.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::event::{NetworkEvent, RequestData, RequestId, RequestWillBeSent, ResponseReceived};
use crate::har::{Header, PostData};

/// Sentinel for "the instrumentation did not report a size".
pub const SIZE_UNKNOWN: i64 = -1;

/// The working record for one logical network exchange, keyed by
/// [`RequestId`]. Request-side fields are written once by the first
/// request-initiated event; response-side data arrives later or not at all.
#[derive(Clone, Debug)]
pub struct CorrelatedRequest {
    pub id: RequestId,
    pub method: String,
    pub url: String,
    /// Ordered name/value list; duplicates preserved in arrival order.
    pub headers: Vec<Header>,
    pub post_data: Option<PostData>,
    /// Computed from the post data length; zero for bodiless requests.
    pub body_size: i64,
    /// Always [`SIZE_UNKNOWN`]: header sizes are not observable here.
    pub headers_size: i64,
    /// Filled in by the resolver; stays `None` when the fetch fails.
    pub response_body: Option<Value>,
    pub request_ts: Option<f64>,
    pub response_ts: Option<f64>,
}

impl CorrelatedRequest {
    fn from_request_event(ev: RequestWillBeSent) -> Self {
        let RequestWillBeSent {
            request_id,
            request,
            timestamp,
        } = ev;
        let headers = flatten_headers(&request);
        let post_data = build_post_data(&request, &headers);
        let body_size = post_data.as_ref().map_or(0, |p| p.text.len() as i64);
        Self {
            id: request_id,
            method: request.method,
            url: request.url,
            headers,
            post_data,
            body_size,
            headers_size: SIZE_UNKNOWN,
            response_body: None,
            request_ts: timestamp,
            response_ts: None,
        }
    }
}

fn flatten_headers(request: &RequestData) -> Vec<Header> {
    request
        .headers
        .iter()
        .map(|(name, value)| Header {
            name: name.clone(),
            value: match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            },
        })
        .collect()
}

fn build_post_data(request: &RequestData, headers: &[Header]) -> Option<PostData> {
    let text = request.post_data.clone()?;
    let mime_type = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-type"))
        .map(|h| h.value.clone())
        .unwrap_or_default();
    Some(PostData { mime_type, text })
}

/// Folds the filtered event stream into `RequestId → CorrelatedRequest`.
///
/// Lives for exactly one run; [`Correlator::finish`] consumes it, so a stale
/// request id can never leak into a later run's mapping.
#[derive(Debug, Default)]
pub struct Correlator {
    records: HashMap<RequestId, CorrelatedRequest>,
    order: Vec<RequestId>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the mapping.
    ///
    /// Duplicate request-initiated events for a known id are ignored (first
    /// writer wins) — the instrumentation layer can emit retries. Response
    /// events for an unknown id are orphans and dropped; that gap is
    /// accepted, not an error.
    pub fn observe(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::RequestWillBeSent(ev) => self.on_request(ev),
            NetworkEvent::ResponseReceived(ev) => self.on_response(ev),
            NetworkEvent::Ignored => {}
        }
    }

    fn on_request(&mut self, ev: RequestWillBeSent) {
        if self.records.contains_key(&ev.request_id) {
            debug!(
                target: "trace.correlate",
                request_id = %ev.request_id,
                "duplicate request event ignored"
            );
            return;
        }
        let record = CorrelatedRequest::from_request_event(ev);
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    fn on_response(&mut self, ev: ResponseReceived) {
        match self.records.get_mut(&ev.request_id) {
            Some(record) => {
                if record.response_ts.is_none() {
                    record.response_ts = ev.timestamp;
                }
            }
            None => {
                debug!(
                    target: "trace.correlate",
                    request_id = %ev.request_id,
                    "orphan response event dropped"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the mapping, returning records in correlation order.
    pub fn finish(mut self) -> Vec<CorrelatedRequest> {
        self.order
            .iter()
            .filter_map(|id| self.records.remove(id))
            .collect()
    }
}

/// Convenience fold over an already-decoded event sequence.
pub fn correlate(events: impl IntoIterator<Item = NetworkEvent>) -> Vec<CorrelatedRequest> {
    let mut correlator = Correlator::new();
    for event in events {
        correlator.observe(event);
    }
    correlator.finish()
}
