//! Thin wrapper around a `fantoccini` WebDriver client, configured so the
//! trace strategy has something to read: Chrome's performance log captures
//! the devtools network event stream.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Value};
use tracing::info;
use webdriver::capabilities::Capabilities;

use harcap_trace::{BodyError, BodySource, RequestId, TraceError, TraceSource};

use crate::commands::{ExecuteCdp, GetLog};

/// How to reach and configure the browser.
#[derive(Clone, Debug)]
pub struct DriverSettings {
    /// WebDriver service endpoint (chromedriver).
    pub webdriver_url: String,
    pub headless: bool,
    /// Route traffic through this proxy; set for the proxy capture strategy.
    pub proxy_server: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            proxy_server: None,
        }
    }
}

/// A live browser session with network instrumentation enabled.
pub struct HarcapDriver {
    pub client: Client,
}

impl HarcapDriver {
    /// Connect to a running WebDriver service and open a browser.
    pub async fn connect(settings: &DriverSettings) -> Result<Self> {
        let mut caps = Capabilities::new();

        let mut args = vec!["--ignore-certificate-errors".to_string()];
        if settings.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }
        if let Some(proxy) = &settings.proxy_server {
            args.push(format!("--proxy-server={proxy}"));
        }
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(args));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
        // The performance log is the trace strategy's event source.
        caps.insert("goog:loggingPrefs".to_string(), json!({"performance": "ALL"}));

        info!(target: "driver", url = %settings.webdriver_url, headless = settings.headless, "connecting to webdriver");
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("failed to connect to webdriver at {}", settings.webdriver_url))?;

        Ok(Self { client })
    }

    /// Navigate the session to `url`.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await?;
        Ok(())
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

fn classify_trace_error(err: CmdError) -> TraceError {
    match err {
        CmdError::Lost(io) => TraceError::SessionLost(io.to_string()),
        other => TraceError::Protocol(other.to_string()),
    }
}

fn classify_body_error(err: CmdError) -> BodyError {
    match err {
        CmdError::Lost(io) => BodyError::Transport(io.to_string()),
        CmdError::WaitTimeout => BodyError::Timeout,
        CmdError::Standard(wd) => {
            // Chromedriver answers "No resource with given identifier" or
            // "No data found" when the body was never captured or has been
            // evicted from the buffer.
            let msg = wd.to_string();
            if msg.contains("No resource") || msg.contains("No data found") {
                BodyError::NoBody
            } else {
                BodyError::Protocol(msg)
            }
        }
        other => BodyError::Protocol(other.to_string()),
    }
}

#[async_trait]
impl BodySource for HarcapDriver {
    async fn response_body(&mut self, id: &RequestId) -> Result<Value, BodyError> {
        self.client
            .issue_cmd(ExecuteCdp::new(
                "Network.getResponseBody",
                json!({"requestId": id.as_str()}),
            ))
            .await
            .map_err(classify_body_error)
    }
}

#[async_trait]
impl TraceSource for HarcapDriver {
    async fn performance_events(&mut self) -> Result<Vec<Value>, TraceError> {
        let raw = self
            .client
            .issue_cmd(GetLog::performance())
            .await
            .map_err(classify_trace_error)?;
        match raw {
            Value::Array(records) => Ok(records),
            other => Err(TraceError::Protocol(format!(
                "unexpected log payload shape: {other}"
            ))),
        }
    }
}
