//! CRV (commit-review-validate) gate types.
//!
//! A CRV gate is a named, configurable check that validates a proposed data
//! commit against a set of validators and may block the commit on failure.
//! The gate engine itself is an external collaborator; these types are its
//! wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result from a single validator within a gate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorResult {
    /// Whether this validator passed.
    pub valid: bool,
    /// Reason for the outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Confidence score in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A proposed state change to be validated by a gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub data: Value,
}

/// Gate configuration attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Gate name (reported back in `GateResult::gate_name`).
    pub name: String,
    /// Validator identifiers to evaluate.
    pub validators: Vec<String>,
    /// Whether a failing run blocks the commit.
    pub block_on_failure: bool,
    /// Minimum confidence threshold in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_confidence: Option<f64>,
}

/// Verdict of one gate evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    /// Whether the gate passed overall.
    pub passed: bool,
    /// Name of the gate that ran.
    pub gate_name: String,
    /// Per-validator sub-results.
    pub validation_results: Vec<ValidatorResult>,
    /// Whether the commit was blocked.
    pub blocked_commit: bool,
    /// When the gate ran.
    pub timestamp: DateTime<Utc>,
}
