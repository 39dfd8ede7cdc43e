//! HAR 1.2 document model and the entry builder.
//!
//! The schema requires fixed key sets, so absent data is represented as
//! present-but-empty: a failed body fetch becomes `{"text": ""}`, a missing
//! post body serialises as an explicit `null`, unmeasured timings as zero.
//! Every type round-trips through serde so produced archives can be read
//! back for inspection and tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::correlate::CorrelatedRequest;

pub const HAR_VERSION: &str = "1.2";

/// The tool identity recorded in `log.creator`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub version: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            name: "harcap".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTimings {
    pub on_content_load: i64,
    pub on_load: i64,
}

impl Default for PageTimings {
    fn default() -> Self {
        // Page-level timings are not measured by this pipeline.
        Self {
            on_content_load: -1,
            on_load: -1,
        }
    }
}

/// The single logical page descriptor each document carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub title: String,
    pub page_timings: PageTimings,
}

impl Page {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            page_timings: PageTimings::default(),
        }
    }
}

/// One header name/value pair. Repeats are legal and order is preserved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub mime_type: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    pub method: String,
    pub url: String,
    pub http_version: String,
    pub cookies: Vec<Value>,
    pub headers: Vec<Header>,
    pub query_string: Vec<Value>,
    /// Serialises as `null` when absent; the key itself is always present.
    pub post_data: Option<PostData>,
    pub headers_size: i64,
    pub body_size: i64,
}

/// `cache` is required by the schema but carries nothing here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub send: f64,
    pub wait: f64,
    pub receive: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            send: 0.0,
            wait: 0.0,
            receive: 0.0,
        }
    }
}

/// One archived exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarEntry {
    pub request: HarRequest,
    /// The browser-returned body payload verbatim, or `{"text": ""}` when
    /// resolution failed.
    pub response: Value,
    pub cache: Cache,
    pub timings: Timings,
}

impl HarEntry {
    /// Pure, deterministic projection of one resolved working record.
    pub fn from_correlated(record: CorrelatedRequest) -> Self {
        let timings = Timings {
            send: 0.0,
            wait: wait_millis(record.request_ts, record.response_ts),
            receive: 0.0,
        };
        Self {
            request: HarRequest {
                method: record.method,
                url: record.url,
                http_version: "HTTP/1.1".to_string(),
                cookies: Vec::new(),
                headers: record.headers,
                query_string: Vec::new(),
                post_data: record.post_data,
                headers_size: record.headers_size,
                body_size: record.body_size,
            },
            response: record.response_body.unwrap_or_else(|| json!({"text": ""})),
            cache: Cache::default(),
            timings,
        }
    }
}

/// Wait time in milliseconds when both endpoints were observed, else zero.
fn wait_millis(request_ts: Option<f64>, response_ts: Option<f64>) -> f64 {
    match (request_ts, response_ts) {
        (Some(start), Some(end)) => ((end - start) * 1000.0).max(0.0),
        _ => 0.0,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarLog {
    pub version: String,
    pub creator: Creator,
    pub pages: Vec<Page>,
    pub entries: Vec<HarEntry>,
}

/// A complete archive. Write-once: assembled, serialized, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarDocument {
    pub log: HarLog,
}

impl HarDocument {
    pub fn new(creator: Creator, page: Page, entries: Vec<HarEntry>) -> Self {
        Self {
            log: HarLog {
                version: HAR_VERSION.to_string(),
                creator,
                pages: vec![page],
                entries,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::SIZE_UNKNOWN;
    use crate::event::RequestId;

    fn bare_record() -> CorrelatedRequest {
        CorrelatedRequest {
            id: RequestId::new("1"),
            method: "GET".to_string(),
            url: "https://example.com".to_string(),
            headers: Vec::new(),
            post_data: None,
            body_size: 0,
            headers_size: SIZE_UNKNOWN,
            response_body: None,
            request_ts: None,
            response_ts: None,
        }
    }

    #[test]
    fn entry_is_schema_complete_without_body_or_timings() {
        let entry = HarEntry::from_correlated(bare_record());
        let value = serde_json::to_value(&entry).unwrap();

        let request = value.get("request").unwrap();
        for key in [
            "method",
            "url",
            "httpVersion",
            "cookies",
            "headers",
            "queryString",
            "postData",
            "headersSize",
            "bodySize",
        ] {
            assert!(request.get(key).is_some(), "missing request key {key}");
        }
        assert_eq!(request["postData"], Value::Null);
        assert_eq!(request["headersSize"], json!(-1));
        assert_eq!(request["bodySize"], json!(0));
        assert_eq!(value["response"], json!({"text": ""}));
        assert_eq!(value["cache"], json!({}));
        assert_eq!(
            value["timings"],
            json!({"send": 0.0, "wait": 0.0, "receive": 0.0})
        );
    }

    #[test]
    fn builder_is_deterministic() {
        let mut record = bare_record();
        record.response_body = Some(json!({"text": "hello"}));
        let a = HarEntry::from_correlated(record.clone());
        let b = HarEntry::from_correlated(record);
        assert_eq!(a, b);
    }

    #[test]
    fn wait_is_computed_from_timestamps_and_clamped() {
        let mut record = bare_record();
        record.request_ts = Some(10.0);
        record.response_ts = Some(10.25);
        let entry = HarEntry::from_correlated(record.clone());
        assert_eq!(entry.timings.wait, 250.0);

        // Reordered timestamps never produce a negative duration.
        record.request_ts = Some(11.0);
        record.response_ts = Some(10.0);
        let entry = HarEntry::from_correlated(record);
        assert_eq!(entry.timings.wait, 0.0);
    }

    #[test]
    fn document_shape_matches_har_1_2() {
        let doc = HarDocument::new(
            Creator::default(),
            Page::new("page_1", "run"),
            vec![HarEntry::from_correlated(bare_record())],
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["log"]["version"], json!("1.2"));
        assert_eq!(value["log"]["creator"]["name"], json!("harcap"));
        assert_eq!(
            value["log"]["pages"][0]["pageTimings"],
            json!({"onContentLoad": -1, "onLoad": -1})
        );
        assert_eq!(value["log"]["entries"].as_array().unwrap().len(), 1);
    }
}
