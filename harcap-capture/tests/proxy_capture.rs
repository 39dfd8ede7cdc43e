//! Strategy (a): the proxy hands back a pre-built archive blob.

use std::time::Duration;

use async_trait::async_trait;
use harcap_capture::{execute_with_proxy, PrebuiltHarSource, RunPlan, Scenario};
use harcap_trace::Creator;
use serde_json::{json, Value};
use tempfile::TempDir;

struct FakeProxy {
    started: Vec<String>,
}

#[async_trait]
impl PrebuiltHarSource for FakeProxy {
    async fn start_capture(&mut self, name: &str) -> anyhow::Result<()> {
        self.started.push(name.to_string());
        Ok(())
    }

    async fn fetch_archive(&mut self) -> anyhow::Result<Value> {
        let name = self.started.last().cloned().unwrap_or_default();
        Ok(json!({"log": {"version": "1.2", "entries": [], "pages": [{"id": name}]}}))
    }
}

struct Noop;

#[async_trait]
impl Scenario<()> for Noop {
    async fn run(&self, _browser: &mut (), _argument: Option<&str>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn proxy_blob_is_written_verbatim_per_run() {
    let dir = TempDir::new().unwrap();
    let plan = RunPlan {
        arguments: vec!["a".to_string(), "b".to_string()],
        output_base: dir.path().join("session.har"),
        settle: Duration::ZERO,
        creator: Creator::default(),
    };
    let mut proxy = FakeProxy {
        started: Vec::new(),
    };

    let outcomes = execute_with_proxy(&mut (), &mut proxy, &Noop, &plan)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(proxy.started, ["session_a", "session_b"]);

    let raw = std::fs::read_to_string(dir.path().join("session_b.har")).unwrap();
    let blob: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(blob["log"]["pages"][0]["id"], json!("session_b"));
}
