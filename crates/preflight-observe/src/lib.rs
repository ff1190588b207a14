//! Observability bootstrap shared by the preflight binary and tests.

pub mod tracing_setup;
