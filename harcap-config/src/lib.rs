//! Loader for the capture configuration: JSON file + environment overlays.
//!
//! The file (`config.json` by convention) selects a registered scenario and
//! describes the capture session; `HARCAP_`-prefixed environment variables
//! override individual keys, and `${VAR}` placeholders inside values are
//! expanded before deserialization. Configuration problems are fatal and
//! must surface before any browser is started.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAX_ENV_EXPANSION_DEPTH: usize = 8;

/// Which capture strategy drives a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStrategy {
    /// Compile the browser's own instrumentation trace (the default).
    Trace,
    /// Fetch a pre-built archive from an external recording proxy.
    Proxy,
}

impl Default for CaptureStrategy {
    fn default() -> Self {
        Self::Trace
    }
}

/// The full configuration surface.
#[derive(Debug, Deserialize)]
pub struct HarcapConfig {
    /// Name of a statically registered scenario to replay.
    pub scenario: String,
    /// Base name for per-run archive files.
    pub output_har_filename: PathBuf,
    /// Seconds to wait after the scenario before draining the trace.
    #[serde(default)]
    pub wait_time_after_script: f64,
    /// Arguments the scenario is replayed over; empty means one implicit run.
    #[serde(default)]
    pub run_args: Vec<String>,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub strategy: CaptureStrategy,
    /// REST endpoint of the recording proxy; required for the proxy strategy.
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Address the browser routes its traffic through (`host:port`); set
    /// alongside `proxy_url` so the recording proxy actually sees traffic.
    #[serde(default)]
    pub browser_proxy: Option<String>,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

impl HarcapConfig {
    /// Cross-field checks the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scenario.trim().is_empty() {
            return Err(ConfigError::Message(
                "'scenario' must name a registered scenario".into(),
            ));
        }
        if self.output_har_filename.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "'output_har_filename' must not be empty".into(),
            ));
        }
        if self.wait_time_after_script < 0.0 {
            return Err(ConfigError::Message(
                "'wait_time_after_script' must be non-negative".into(),
            ));
        }
        if self.strategy == CaptureStrategy::Proxy && self.proxy_url.is_none() {
            return Err(ConfigError::Message(
                "the proxy strategy requires 'proxy_url'".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `${VAR}` placeholders recursively, with a depth cap so cyclic
/// definitions terminate instead of looping.
fn expand_env(value: &mut Value) {
    match value {
        Value::String(s) if s.contains('$') => {
            let mut current = std::mem::take(s);
            for _ in 0..MAX_ENV_EXPANSION_DEPTH {
                let expanded = match shellexpand::env(&current) {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => current.clone(),
                };
                if expanded == current {
                    break;
                }
                current = expanded;
            }
            *s = current;
        }
        Value::Array(items) => items.iter_mut().for_each(expand_env),
        Value::Object(fields) => fields.values_mut().for_each(expand_env),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (JSON file + env overrides).
pub struct HarcapConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HarcapConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HarcapConfigLoader {
    /// Start with the `HARCAP_` environment overlay attached.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("HARCAP").separator("__"));
        Self { builder }
    }

    /// Attach a configuration file. A missing file surfaces as a distinct,
    /// readable error when [`Self::load`] runs.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline JSON snippet; used by tests and the CLI.
    pub fn with_json_str(mut self, json: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(json, config::FileFormat::Json));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, deserialize, and
    /// run cross-field validation.
    pub fn load(self) -> Result<HarcapConfig, ConfigError> {
        let merged = self.builder.build()?;

        let mut raw: Value = merged.try_deserialize()?;
        expand_env(&mut raw);

        let typed: HarcapConfig =
            serde_json::from_value(raw).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
