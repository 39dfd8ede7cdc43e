//! Built-in scenarios and the default registry.
//!
//! User automation plugs in here: implement [`Scenario`] for
//! [`HarcapDriver`], register it under a name, and select that name in the
//! config file.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

use harcap_capture::{Scenario, ScenarioRegistry};

use crate::driver::HarcapDriver;

/// Navigate to one URL per run: the run argument when present, otherwise a
/// fixed fallback.
pub struct VisitScenario {
    pub fallback_url: Option<String>,
}

#[async_trait]
impl Scenario<HarcapDriver> for VisitScenario {
    async fn run(&self, browser: &mut HarcapDriver, argument: Option<&str>) -> anyhow::Result<()> {
        let url = argument
            .or(self.fallback_url.as_deref())
            .context("the visit scenario needs a URL run argument")?;
        info!(target: "driver.scenario", %url, "navigating");
        browser.goto(url).await
    }
}

/// The statically-declared table the config's `scenario` key resolves
/// against.
pub fn builtin_scenarios() -> ScenarioRegistry<HarcapDriver> {
    let mut registry = ScenarioRegistry::new();
    registry.register(
        "visit",
        Arc::new(VisitScenario {
            fallback_url: Some("https://www.example.com".to_string()),
        }),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_is_registered_by_default() {
        let registry = builtin_scenarios();
        assert!(registry.get("visit").is_some());
        assert_eq!(registry.names(), ["visit"]);
    }
}
