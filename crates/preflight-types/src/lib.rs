//! Shared domain types for Preflight.
//!
//! This crate contains the data model for the pre-deployment verification
//! gate: workflow specifications, CRV gate configuration and results,
//! policy principals and decisions, simulation test cases and results,
//! and telemetry events.
//!
//! Zero infrastructure dependencies -- only serde, uuid, and chrono.

pub mod crv;
pub mod policy;
pub mod telemetry;
pub mod testing;
pub mod workflow;
