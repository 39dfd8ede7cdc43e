//! Chromedriver-specific WebDriver commands.
//!
//! `fantoccini` only models the W3C-standard endpoints, so the log drain
//! and CDP bridge are issued as custom commands through
//! [`fantoccini::Client::issue_cmd`].

use fantoccini::wd::WebDriverCompatibleCommand;
use http::Method;
use serde_json::{json, Value};
use url::{ParseError, Url};

/// `POST /session/{id}/log` — drain one browser log type. Draining resets
/// the buffer, so consecutive calls see only new records.
#[derive(Debug, Clone)]
pub struct GetLog {
    log_type: String,
}

impl GetLog {
    /// The devtools network event stream.
    pub fn performance() -> Self {
        Self {
            log_type: "performance".to_string(),
        }
    }
}

impl WebDriverCompatibleCommand for GetLog {
    fn endpoint(&self, base_url: &Url, session_id: Option<&str>) -> Result<Url, ParseError> {
        base_url.join(&format!("session/{}/log", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &Url) -> (Method, Option<String>) {
        (Method::POST, Some(json!({"type": self.log_type}).to_string()))
    }
}

/// `POST /session/{id}/goog/cdp/execute` — run one devtools protocol
/// command in the page's context and return its raw result.
#[derive(Debug, Clone)]
pub struct ExecuteCdp {
    cmd: String,
    params: Value,
}

impl ExecuteCdp {
    pub fn new(cmd: impl Into<String>, params: Value) -> Self {
        Self {
            cmd: cmd.into(),
            params,
        }
    }
}

impl WebDriverCompatibleCommand for ExecuteCdp {
    fn endpoint(&self, base_url: &Url, session_id: Option<&str>) -> Result<Url, ParseError> {
        base_url.join(&format!(
            "session/{}/goog/cdp/execute",
            session_id.unwrap_or_default()
        ))
    }

    fn method_and_body(&self, _request_url: &Url) -> (Method, Option<String>) {
        (
            Method::POST,
            Some(json!({"cmd": self.cmd, "params": self.params}).to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:9515/").unwrap()
    }

    #[test]
    fn log_drain_hits_the_session_log_endpoint() {
        let cmd = GetLog::performance();
        let url = cmd.endpoint(&base(), Some("abc123")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9515/session/abc123/log");

        let (method, body) = cmd.method_and_body(&url);
        assert_eq!(method, Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body, json!({"type": "performance"}));
    }

    #[test]
    fn cdp_execute_carries_command_and_params() {
        let cmd = ExecuteCdp::new("Network.getResponseBody", json!({"requestId": "42"}));
        let url = cmd.endpoint(&base(), Some("abc123")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9515/session/abc123/goog/cdp/execute"
        );

        let (method, body) = cmd.method_and_body(&url);
        assert_eq!(method, Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"cmd": "Network.getResponseBody", "params": {"requestId": "42"}})
        );
    }
}
