//! Per-run pipeline execution and archive persistence.
//!
//! For each run argument: run the scenario, let trailing network activity
//! settle, compile the drained trace into a HAR document, and write it to a
//! path derived from the configured base name and the argument. A failure
//! in one run is reported and the remaining arguments still execute; only
//! browser session loss aborts the whole orchestration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use harcap_trace::har::Page;
use harcap_trace::{compile_entries, Creator, HarDocument, TraceError, TraceSource};

use crate::scenario::Scenario;

/// Everything one orchestration needs, threaded explicitly; no ambient
/// working-directory writes.
#[derive(Clone, Debug)]
pub struct RunPlan {
    /// Run arguments; empty means one implicit run with no argument.
    pub arguments: Vec<String>,
    /// Base output path; per-run paths are derived from it.
    pub output_base: PathBuf,
    /// Pause between scenario completion and log drain, letting trailing
    /// requests land in the instrumentation buffer.
    pub settle: Duration,
    pub creator: Creator,
}

impl RunPlan {
    fn runs(&self) -> Vec<Option<String>> {
        if self.arguments.is_empty() {
            vec![None]
        } else {
            self.arguments.iter().cloned().map(Some).collect()
        }
    }

    fn capture_name(&self, argument: Option<&str>) -> String {
        let stem = self
            .output_base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("capture");
        match argument {
            Some(arg) => format!("{stem}_{arg}"),
            None => stem.to_string(),
        }
    }
}

/// A recoverable failure scoped to one run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("scenario failed: {0:#}")]
    Scenario(#[source] anyhow::Error),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("failed to write archive {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("proxy capture failed: {0:#}")]
    Proxy(#[source] anyhow::Error),
    #[error("could not serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fatal: the browser handle is gone, no further run can proceed.
#[derive(Debug, Error)]
#[error("browser session lost: {0}")]
pub struct SessionLost(pub String);

/// Terminal state of one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub argument: Option<String>,
    pub result: Result<PathBuf, RunError>,
}

/// Strategy (b): compile the browser's own instrumentation trace.
///
/// Returns the per-run outcomes, or [`SessionLost`] when the browser handle
/// died mid-orchestration (outcomes up to and including the fatal run are
/// discarded with it; the caller is shutting down anyway).
pub async fn execute<B>(
    browser: &mut B,
    scenario: &dyn Scenario<B>,
    plan: &RunPlan,
) -> Result<Vec<RunOutcome>, SessionLost>
where
    B: TraceSource + Send,
{
    let runs = plan.runs();
    let total = runs.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, argument) in runs.into_iter().enumerate() {
        info!(
            target: "capture.run",
            run = index + 1,
            total,
            argument = argument.as_deref().unwrap_or(""),
            "run started"
        );
        let result = trace_run(browser, scenario, plan, argument.as_deref(), index).await;
        match &result {
            Ok(path) => {
                info!(target: "capture.run", run = index + 1, path = %path.display(), "run completed");
            }
            Err(RunError::Trace(TraceError::SessionLost(msg))) => {
                return Err(SessionLost(msg.clone()));
            }
            Err(err) => {
                warn!(target: "capture.run", run = index + 1, error = %err, "run failed; continuing");
            }
        }
        outcomes.push(RunOutcome { argument, result });
    }

    Ok(outcomes)
}

async fn trace_run<B>(
    browser: &mut B,
    scenario: &dyn Scenario<B>,
    plan: &RunPlan,
    argument: Option<&str>,
    index: usize,
) -> Result<PathBuf, RunError>
where
    B: TraceSource + Send,
{
    scenario
        .run(browser, argument)
        .await
        .map_err(RunError::Scenario)?;
    settle(plan.settle).await;

    let records = browser.performance_events().await?;
    let entries = compile_entries(&records, browser).await;

    let page = Page::new(format!("page_{}", index + 1), plan.capture_name(argument));
    let document = HarDocument::new(plan.creator.clone(), page, entries);
    let path = output_path(&plan.output_base, argument);
    write_json(&path, &document).await?;
    Ok(path)
}

/// Strategy (a): a recording proxy hands back a pre-built HAR blob, written
/// verbatim to the per-run path.
pub async fn execute_with_proxy<B, P>(
    browser: &mut B,
    proxy: &mut P,
    scenario: &dyn Scenario<B>,
    plan: &RunPlan,
) -> Result<Vec<RunOutcome>, SessionLost>
where
    B: Send,
    P: PrebuiltHarSource,
{
    let runs = plan.runs();
    let total = runs.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, argument) in runs.into_iter().enumerate() {
        info!(
            target: "capture.run",
            run = index + 1,
            total,
            argument = argument.as_deref().unwrap_or(""),
            strategy = "proxy",
            "run started"
        );
        let result = proxy_run(browser, proxy, scenario, plan, argument.as_deref()).await;
        match &result {
            Ok(path) => {
                info!(target: "capture.run", run = index + 1, path = %path.display(), "run completed");
            }
            Err(err) => {
                warn!(target: "capture.run", run = index + 1, error = %err, "run failed; continuing");
            }
        }
        outcomes.push(RunOutcome { argument, result });
    }

    Ok(outcomes)
}

async fn proxy_run<B, P>(
    browser: &mut B,
    proxy: &mut P,
    scenario: &dyn Scenario<B>,
    plan: &RunPlan,
    argument: Option<&str>,
) -> Result<PathBuf, RunError>
where
    B: Send,
    P: PrebuiltHarSource,
{
    proxy
        .start_capture(&plan.capture_name(argument))
        .await
        .map_err(RunError::Proxy)?;
    scenario
        .run(browser, argument)
        .await
        .map_err(RunError::Scenario)?;
    settle(plan.settle).await;

    let blob = proxy.fetch_archive().await.map_err(RunError::Proxy)?;
    let path = output_path(&plan.output_base, argument);
    write_json(&path, &blob).await?;
    Ok(path)
}

/// External recording proxy: starts a named capture, returns the
/// accumulated archive as a raw blob.
#[async_trait]
pub trait PrebuiltHarSource: Send {
    /// Begin a fresh named capture, discarding previously recorded traffic.
    async fn start_capture(&mut self, name: &str) -> anyhow::Result<()>;
    /// Fetch the archive recorded since [`Self::start_capture`].
    async fn fetch_archive(&mut self) -> anyhow::Result<Value>;
}

async fn settle(duration: Duration) {
    if !duration.is_zero() {
        info!(
            target: "capture.run",
            settle_secs = duration.as_secs_f64(),
            "waiting for trailing network activity"
        );
        tokio::time::sleep(duration).await;
    }
}

/// Derive the per-run output path from the base name and the run argument.
///
/// `out.har` + `value1` → `out_value1.har`; the implicit argument keeps the
/// base path unchanged. Argument text is sanitised so it cannot escape the
/// output directory.
pub fn output_path(base: &Path, argument: Option<&str>) -> PathBuf {
    let Some(arg) = argument else {
        return base.to_path_buf();
    };
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("capture");
    let arg = sanitize_fragment(arg);
    let name = match base.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_{arg}.{ext}"),
        None => format!("{stem}_{arg}"),
    };
    base.with_file_name(name)
}

fn sanitize_fragment(argument: &str) -> String {
    argument
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Whole-document write: one serialize, one write call.
async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RunError> {
    let bytes = serde_json::to_vec(value)?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| RunError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_argument_keeps_base_path() {
        assert_eq!(
            output_path(Path::new("/tmp/out.har"), None),
            PathBuf::from("/tmp/out.har")
        );
    }

    #[test]
    fn argument_is_spliced_before_the_extension() {
        assert_eq!(
            output_path(Path::new("/tmp/out.har"), Some("value1")),
            PathBuf::from("/tmp/out_value1.har")
        );
        assert_eq!(
            output_path(Path::new("capture"), Some("v2")),
            PathBuf::from("capture_v2")
        );
    }

    #[test]
    fn hostile_arguments_cannot_escape_the_output_directory() {
        assert_eq!(
            output_path(Path::new("/tmp/out.har"), Some("../../etc/passwd")),
            PathBuf::from("/tmp/out_..-..-etc-passwd.har")
        );
    }
}
