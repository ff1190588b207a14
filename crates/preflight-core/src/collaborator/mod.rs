//! Collaborator ports consumed by the validators and the simulation runner.
//!
//! The verification gate and policy guard are async (a real implementation
//! calls out to an external engine) and are injected as `Arc<dyn ...>`, so
//! their trait methods return boxed futures. The workflow checker and
//! evaluation harness are pure computations and stay synchronous.
//!
//! Built-in simulation implementations live in [`builtin`].

pub mod builtin;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use preflight_types::crv::{Commit, GateConfig, GateResult};
use preflight_types::policy::{Action, GuardDecision, Principal};
use preflight_types::telemetry::TelemetryEvent;
use preflight_types::testing::EvaluationReport;
use preflight_types::workflow::{SafetyPolicy, WorkflowSpec};

/// Boxed future alias for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure surfaced by any collaborator call.
///
/// The runner treats these as unrecoverable for the current run; they become
/// an `error`-status test result, never a partial one.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

// ---------------------------------------------------------------------------
// Verification gate
// ---------------------------------------------------------------------------

/// Evaluates a proposed data commit against a named set of validators.
///
/// The task's gate configuration travels with the call so a single gate
/// engine instance can serve every task's named gate.
pub trait VerificationGate: Send + Sync {
    fn validate<'a>(
        &'a self,
        commit: &'a Commit,
        gate: &'a GateConfig,
    ) -> BoxFuture<'a, Result<GateResult, CollaboratorError>>;
}

// ---------------------------------------------------------------------------
// Policy guard
// ---------------------------------------------------------------------------

/// Risk-tier-aware authorization engine deciding
/// allow / deny / requires-human-approval for a principal and action.
pub trait PolicyGuard: Send + Sync {
    fn evaluate<'a>(
        &'a self,
        principal: &'a Principal,
        action: &'a Action,
    ) -> BoxFuture<'a, Result<GuardDecision, CollaboratorError>>;
}

// ---------------------------------------------------------------------------
// Workflow checker
// ---------------------------------------------------------------------------

/// Severity of a checker finding. Only `Error` blocks validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding produced by the workflow checker's rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerFinding {
    /// Tasks involved in the finding.
    pub task_ids: Vec<String>,
    /// The checker's own rule-type tag; remapped into the core taxonomy
    /// by `validate_policy`.
    pub rule_type: String,
    pub message: String,
    pub severity: Severity,
}

/// Report returned from one checker evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerReport {
    pub violations: Vec<CheckerFinding>,
    pub warnings: Vec<CheckerFinding>,
}

/// Policy rule engine evaluating a safety policy over a workflow spec.
pub trait WorkflowChecker: Send + Sync {
    fn validate(&self, spec: &WorkflowSpec, policy: &SafetyPolicy) -> CheckerReport;
}

// ---------------------------------------------------------------------------
// Evaluation harness
// ---------------------------------------------------------------------------

/// Optional report generator run over a test's scoped telemetry.
pub trait EvaluationHarness: Send + Sync {
    /// Aggregate the run's events into a report.
    fn generate_report(
        &self,
        events: &[TelemetryEvent],
    ) -> Result<EvaluationReport, CollaboratorError>;

    /// Render a report as Markdown for the `report_markdown` artifact.
    fn export_report_markdown(&self, report: &EvaluationReport) -> String;
}
