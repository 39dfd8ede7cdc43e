//! Shared utilities for the harcap workspace.
//!
//! Currently this is the home of [`observability`], the centralised
//! `tracing` initialisation used by the `harcap` binary and by integration
//! tests. It is intentionally lightweight so every crate can depend on it
//! without heavy transitive costs.
pub mod observability;
