//! Verification-gate core: DAG validation and side-effect-free simulation.
//!
//! This crate contains the "brain" of the pre-deployment gate:
//! - `validator` -- topology, policy, and CRV-coverage checks over a
//!   `WorkflowSpec`, producing findings as data (never errors)
//! - `runner` -- the dry-run execution harness that drives CRV gates and
//!   policy-guard decisions per task and packages results and artifacts
//! - `collaborator` -- trait ports for the external verification gate,
//!   policy guard, workflow checker, and evaluation harness, plus the
//!   built-in simulation implementations
//! - `telemetry` -- the test-scoped telemetry buffer
//!
//! Collaborator traits are defined here and implemented either by the
//! built-ins (for simulation) or by the hosting platform (for real gates).

pub mod collaborator;
pub mod runner;
pub mod telemetry;
pub mod validator;
