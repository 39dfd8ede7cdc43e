//! The narrow capability interface for user automation.
//!
//! A scenario is the one thing user code gets to do: drive the live browser
//! handle for a single run argument. Scenarios are registered statically by
//! name; the config file selects one. There is no dynamic loading of
//! automation code from the filesystem.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

/// One automation routine, replayed once per run argument.
///
/// `argument` is `None` for the single implicit run when no run arguments
/// are configured. Errors are scoped to the current run: the orchestrator
/// reports them and proceeds to the next argument.
#[async_trait]
pub trait Scenario<B: Send>: Send + Sync {
    async fn run(&self, browser: &mut B, argument: Option<&str>) -> anyhow::Result<()>;
}

/// Statically-declared name → scenario table.
pub struct ScenarioRegistry<B> {
    scenarios: HashMap<String, Arc<dyn Scenario<B>>>,
}

impl<B: Send> ScenarioRegistry<B> {
    pub fn new() -> Self {
        Self {
            scenarios: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, scenario: Arc<dyn Scenario<B>>) {
        self.scenarios.insert(name.into(), scenario);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scenario<B>>> {
        self.scenarios.get(name).cloned()
    }

    /// Registered names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.scenarios.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<B: Send> Default for ScenarioRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
