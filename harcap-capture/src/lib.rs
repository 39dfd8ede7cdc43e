//! Run orchestration: replay a scenario over a set of run arguments and
//! write one HAR archive per run.
//!
//! The orchestrator is generic over the browser collaborator traits from
//! `harcap-trace`, so the whole multi-run flow is exercised in tests with
//! in-memory fakes and no browser. Scenarios are resolved through an
//! explicit [`scenario::ScenarioRegistry`] rather than loading user code
//! from arbitrary file paths.
pub mod orchestrator;
pub mod scenario;

pub use orchestrator::{
    execute, execute_with_proxy, output_path, PrebuiltHarSource, RunError, RunOutcome, RunPlan,
    SessionLost,
};
pub use scenario::{Scenario, ScenarioRegistry};
