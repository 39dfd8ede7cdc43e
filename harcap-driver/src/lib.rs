//! The live browser collaborator.
//!
//! - [`driver::HarcapDriver`]: `fantoccini` WebDriver client wrapper with
//!   devtools network instrumentation enabled; implements the trace
//!   collaborator traits from `harcap-trace`
//! - [`commands`]: the chromedriver-specific WebDriver commands the wrapper
//!   issues (performance-log drain, CDP execute)
//! - [`proxy`]: REST client for an external recording proxy (strategy a)
//! - [`scenarios`]: built-in scenario implementations and the default
//!   registry
pub mod commands;
pub mod driver;
pub mod proxy;
pub mod scenarios;

pub use driver::{DriverSettings, HarcapDriver};
pub use proxy::RecordingProxy;
pub use scenarios::builtin_scenarios;
