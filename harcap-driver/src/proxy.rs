//! REST client for an external recording proxy (BrowserMob-compatible).
//!
//! Strategy (a): the proxy observes all traffic and assembles the archive
//! itself; we only start a named capture and fetch the finished blob. The
//! proxy *process* is managed elsewhere — this client just needs its
//! endpoint, e.g. `http://localhost:8080/proxy/8081`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use url::Url;

use harcap_capture::PrebuiltHarSource;

pub struct RecordingProxy {
    base: Url,
    http: reqwest::Client,
}

impl RecordingProxy {
    pub fn new(endpoint: &str) -> Result<Self> {
        // Joining below requires a trailing slash.
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let base = Url::parse(&normalized)
            .with_context(|| format!("invalid proxy endpoint: {endpoint}"))?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    fn har_url(&self) -> Result<Url> {
        self.base.join("har").context("building proxy har URL")
    }
}

#[async_trait]
impl PrebuiltHarSource for RecordingProxy {
    async fn start_capture(&mut self, name: &str) -> Result<()> {
        info!(target: "driver.proxy", capture = name, "starting proxy capture");
        self.http
            .put(self.har_url()?)
            .form(&[("initialPageRef", name)])
            .send()
            .await
            .context("proxy unreachable while starting capture")?
            .error_for_status()
            .context("proxy rejected capture start")?;
        Ok(())
    }

    async fn fetch_archive(&mut self) -> Result<Value> {
        let response = self
            .http
            .get(self.har_url()?)
            .send()
            .await
            .context("proxy unreachable while fetching archive")?
            .error_for_status()
            .context("proxy rejected archive fetch")?;
        response
            .json::<Value>()
            .await
            .context("proxy returned a non-JSON archive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized_for_joining() {
        let proxy = RecordingProxy::new("http://localhost:8080/proxy/8081").unwrap();
        assert_eq!(
            proxy.har_url().unwrap().as_str(),
            "http://localhost:8080/proxy/8081/har"
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(RecordingProxy::new("not a url").is_err());
    }
}
