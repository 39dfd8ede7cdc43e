//! The trace-to-HAR compiler.
//!
//! This crate turns the browser's raw instrumentation event stream into HAR
//! 1.2 documents. It is pure data plumbing: the only contact with a live
//! browser is through the [`resolve::BodySource`] and [`resolve::TraceSource`]
//! traits, which the driver crate (and test fakes) implement.
//!
//! Pipeline, leaves first:
//!
//! - [`event`]: decode raw performance-log records into a closed event enum
//! - [`correlate`]: fold events into one working record per request id
//! - [`resolve`]: best-effort response body fetch, isolated per request
//! - [`har`]: project working records into schema-complete HAR entries
//!
//! Partial failure is the normal case here: malformed records are skipped,
//! orphaned responses are dropped, and a failing body fetch leaves that one
//! entry with an empty body while the rest of the batch proceeds.
pub mod correlate;
pub mod event;
pub mod har;
pub mod resolve;

pub use correlate::{correlate, CorrelatedRequest, Correlator};
pub use event::{decode_events, NetworkEvent, RequestId};
pub use har::{Creator, HarDocument, HarEntry, Page};
pub use resolve::{resolve_bodies, BodyError, BodySource, TraceError, TraceSource};

use serde_json::Value;

/// Run the full compiler over one run's drained log records.
///
/// Decodes and correlates `records`, resolves response bodies through
/// `source`, and returns the finished entries in correlation order. Never
/// fails: every stage degrades per record instead of aborting the batch.
pub async fn compile_entries<S>(records: &[Value], source: &mut S) -> Vec<HarEntry>
where
    S: BodySource + ?Sized,
{
    let events = decode_events(records);
    let mut requests = correlate(events);
    resolve_bodies(source, &mut requests).await;
    requests.into_iter().map(HarEntry::from_correlated).collect()
}
