//! Simulation test cases, results, and artifacts.
//!
//! A `TestCase` bundles a workflow spec with sample data and an optional
//! expected outcome. Running one produces an immutable `TestResult` keyed by
//! a generated execution id, along with exportable `TestArtifact` evidence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::crv::ValidatorResult;
use crate::policy::GuardDecision;
use crate::workflow::{RiskTier, WorkflowSpec};

// ---------------------------------------------------------------------------
// Test case
// ---------------------------------------------------------------------------

/// How a simulation run is labeled and reported.
///
/// Mode is metadata on the result, not a branch in the algorithm: all three
/// modes share one execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    DryRun,
    Validation,
    Simulation,
}

/// Expected outcome assertions for a test case.
///
/// Any field left unset is a wildcard: it matches whatever the run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    /// Expected combined CRV + policy aggregate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_pass: Option<bool>,
    /// Expected CRV aggregate (all gates passed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv_validation: Option<bool>,
    /// Expected policy aggregate (all actions allowed or approval-flagged).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_approval: Option<bool>,
}

/// Input to one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    /// The workflow under test, in plain-data form.
    pub workflow: WorkflowSpec,
    /// Sample data used to build synthetic commits.
    #[serde(default)]
    pub sample_data: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<ExpectedOutcome>,
}

// ---------------------------------------------------------------------------
// Per-task verdicts
// ---------------------------------------------------------------------------

/// One CRV gate's verdict for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrvTestResult {
    pub task_id: String,
    pub gate_name: String,
    pub passed: bool,
    pub blocked_commit: bool,
    pub validation_results: Vec<ValidatorResult>,
    pub timestamp: DateTime<Utc>,
}

/// One task's policy verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTestResult {
    pub action_id: String,
    pub action_name: String,
    pub risk_tier: RiskTier,
    pub decision: GuardDecision,
    /// Derived approver roles this action must pass through.
    pub approval_path: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// The kind of evidence an artifact carries.
///
/// The type determines the MIME label a caller should attach when serving
/// artifact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    ReportJson,
    ReportMarkdown,
    EventsLog,
    Telemetry,
}

impl ArtifactType {
    /// MIME type for serving this artifact's content.
    pub fn mime(&self) -> &'static str {
        match self {
            ArtifactType::ReportJson | ArtifactType::EventsLog | ArtifactType::Telemetry => {
                "application/json"
            }
            ArtifactType::ReportMarkdown => "text/markdown",
        }
    }
}

/// A named, typed, exportable piece of evidence produced by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestArtifact {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub name: String,
    /// Textual content (JSON or Markdown depending on type).
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Test result
// ---------------------------------------------------------------------------

/// Overall status of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
}

/// Aggregated evaluation report over a run's telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub total_events: usize,
    pub crv_gates_evaluated: usize,
    pub crv_gates_passed: usize,
    pub policy_checks: usize,
    pub policy_checks_cleared: usize,
    pub steps_completed: usize,
    pub steps_succeeded: usize,
}

/// Output of one simulation run. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    /// Globally unique per run; the retrieval key.
    pub execution_id: String,
    pub mode: TestMode,
    pub status: TestStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub crv_results: Vec<CrvTestResult>,
    pub policy_results: Vec<PolicyTestResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_report: Option<EvaluationReport>,
    pub artifacts: Vec<TestArtifact>,
    /// Failure message when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Standalone policy simulation
// ---------------------------------------------------------------------------

/// Request for a direct, single-action policy evaluation (no task graph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySimulationRequest {
    /// Principal performing the action; defaults to the synthetic test agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<crate::policy::Principal>,
    pub action: crate::policy::Action,
}

/// Result of a standalone policy simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySimulationResult {
    pub decision: GuardDecision,
    /// Ordered approver roles, or `["Automatic approval"]`.
    pub approval_path: Vec<String>,
    /// Fixed estimate, or `"Immediate"` when no approval is required.
    pub estimated_approval_time: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
