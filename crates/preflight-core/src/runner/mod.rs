//! Simulation runner: executes test cases against injected collaborators
//! without touching real tools or data.
//!
//! `run_test` itself never fails. The inner execution returns a `Result`
//! and the outer method converts any error into a `TestStatus::Error`
//! result, so a collaborator outage is recorded evidence rather than a
//! crashed run.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use preflight_types::crv::Commit;
use preflight_types::policy::{Action, Principal};
use preflight_types::telemetry::{TelemetryEvent, TelemetryEventKind};
use preflight_types::testing::{
    CrvTestResult, EvaluationReport, ExpectedOutcome, PolicySimulationRequest,
    PolicySimulationResult, PolicyTestResult, TestArtifact, TestCase, TestMode, TestResult,
    TestStatus,
};

use crate::collaborator::{CollaboratorError, EvaluationHarness, PolicyGuard, VerificationGate};
use crate::telemetry::{TelemetryBuffer, TelemetrySink};

pub mod approval;
pub mod artifacts;
pub mod store;

use store::ResultStore;

/// Duration reported on step-end events. Simulated steps do no real work,
/// so the value is a fixed placeholder.
const STEP_DURATION_MS: u64 = 10;

/// Failure inside one simulation run. Converted to a `TestStatus::Error`
/// result by `run_test`; surfaced directly by `simulate_policy`.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("task '{task_id}' declares a crv_gate but no verification gate is configured")]
    MissingGate { task_id: String },
    #[error("task '{task_id}' declares a risk_tier but no policy guard is configured")]
    MissingGuard { task_id: String },
    #[error("no policy guard is configured")]
    GuardUnavailable,
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Successful inner-execution outcome, folded into a `TestResult`.
struct ExecutionOutcome {
    crv_results: Vec<CrvTestResult>,
    policy_results: Vec<PolicyTestResult>,
    report: Option<EvaluationReport>,
}

/// Runs test cases against whichever collaborators are injected.
///
/// Collaborators are optional; a task that needs a missing one turns the
/// whole run into an error-status result.
pub struct SimulationRunner {
    gate: Option<Arc<dyn VerificationGate>>,
    guard: Option<Arc<dyn PolicyGuard>>,
    harness: Option<Arc<dyn EvaluationHarness>>,
    store: Arc<dyn ResultStore>,
}

impl SimulationRunner {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            gate: None,
            guard: None,
            harness: None,
            store,
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn VerificationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_guard(mut self, guard: Arc<dyn PolicyGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_harness(mut self, harness: Arc<dyn EvaluationHarness>) -> Self {
        self.harness = Some(harness);
        self
    }

    /// Run one test case. Never fails: execution errors become an
    /// error-status result with the accumulated telemetry attached.
    pub async fn run_test(&self, case: &TestCase, mode: TestMode) -> TestResult {
        let started_at = Utc::now();
        let execution_id = format!("test_{}_{}", case.id, started_at.timestamp_millis());
        let telemetry = TelemetryBuffer::new();

        info!(test = %case.id, execution = %execution_id, ?mode, "starting simulation run");

        let result = match self.execute(case, &execution_id, &telemetry).await {
            Ok(outcome) => {
                let status = determine_test_status(
                    case.expected_outcome.as_ref(),
                    &outcome.crv_results,
                    &outcome.policy_results,
                );
                let artifacts = artifacts::build_artifacts(
                    &execution_id,
                    &outcome.crv_results,
                    &outcome.policy_results,
                    outcome.report.as_ref(),
                    self.harness.as_deref(),
                    &telemetry,
                );
                TestResult {
                    test_id: case.id.clone(),
                    execution_id: execution_id.clone(),
                    mode,
                    status,
                    started_at,
                    completed_at: Utc::now(),
                    crv_results: outcome.crv_results,
                    policy_results: outcome.policy_results,
                    evaluation_report: outcome.report,
                    artifacts,
                    error: None,
                }
            }
            Err(err) => {
                warn!(test = %case.id, execution = %execution_id, error = %err, "simulation run errored");
                let artifacts =
                    artifacts::build_artifacts(&execution_id, &[], &[], None, None, &telemetry);
                TestResult {
                    test_id: case.id.clone(),
                    execution_id: execution_id.clone(),
                    mode,
                    status: TestStatus::Error,
                    started_at,
                    completed_at: Utc::now(),
                    crv_results: vec![],
                    policy_results: vec![],
                    evaluation_report: None,
                    artifacts,
                    error: Some(err.to_string()),
                }
            }
        };

        info!(
            test = %case.id,
            execution = %execution_id,
            status = ?result.status,
            "simulation run finished"
        );
        self.store.insert(result.clone());
        result
    }

    /// Walk the tasks in declaration order, exercising the gate and guard.
    async fn execute(
        &self,
        case: &TestCase,
        execution_id: &str,
        telemetry: &TelemetryBuffer,
    ) -> Result<ExecutionOutcome, RunnerError> {
        let mut crv_results: Vec<CrvTestResult> = Vec::new();
        let mut policy_results: Vec<PolicyTestResult> = Vec::new();

        let sample_data: serde_json::Map<String, serde_json::Value> =
            case.sample_data.clone().into_iter().collect();

        for task in &case.workflow.tasks {
            let mut step_success = true;

            if let Some(gate_config) = &task.crv_gate {
                let gate = self.gate.as_ref().ok_or_else(|| RunnerError::MissingGate {
                    task_id: task.id.clone(),
                })?;
                let commit = Commit {
                    id: format!("{}_commit", task.id),
                    data: serde_json::Value::Object(sample_data.clone()),
                };
                let gate_result = gate.validate(&commit, gate_config).await?;

                telemetry.record_event(TelemetryEvent::now(
                    TelemetryEventKind::CrvGateEvaluated {
                        execution_id: execution_id.to_string(),
                        task_id: task.id.clone(),
                        gate_name: gate_result.gate_name.clone(),
                        passed: gate_result.passed,
                        blocked_commit: gate_result.blocked_commit,
                    },
                ));

                if !gate_result.passed && gate_result.blocked_commit {
                    step_success = false;
                }
                crv_results.push(CrvTestResult {
                    task_id: task.id.clone(),
                    gate_name: gate_result.gate_name,
                    passed: gate_result.passed,
                    blocked_commit: gate_result.blocked_commit,
                    validation_results: gate_result.validation_results,
                    timestamp: gate_result.timestamp,
                });
            }

            if task.risk_tier.is_some() {
                let guard = self.guard.as_ref().ok_or_else(|| RunnerError::MissingGuard {
                    task_id: task.id.clone(),
                })?;
                let tier = task.effective_risk_tier();
                let action = Action {
                    id: task.id.clone(),
                    name: task.name.clone(),
                    risk_tier: tier,
                    required_permissions: task.required_permissions.clone().unwrap_or_default(),
                    tool_name: task.tool_name.clone(),
                };
                let decision = guard.evaluate(&Principal::test_agent(), &action).await?;

                telemetry.record_event(TelemetryEvent::now(TelemetryEventKind::PolicyChecked {
                    execution_id: execution_id.to_string(),
                    task_id: task.id.clone(),
                    action_id: action.id.clone(),
                    risk_tier: tier,
                    allowed: decision.allowed,
                    requires_human_approval: decision.requires_human_approval,
                }));

                if !decision.allowed && !decision.requires_human_approval {
                    step_success = false;
                }
                let approval_path = approval::approval_path(tier, &decision);
                policy_results.push(PolicyTestResult {
                    action_id: action.id,
                    action_name: action.name,
                    risk_tier: tier,
                    decision,
                    approval_path,
                    timestamp: Utc::now(),
                });
            }

            telemetry.record_event(TelemetryEvent::now(TelemetryEventKind::StepStarted {
                execution_id: execution_id.to_string(),
                task_id: task.id.clone(),
                task_name: task.name.clone(),
            }));
            telemetry.record_event(TelemetryEvent::now(TelemetryEventKind::StepCompleted {
                execution_id: execution_id.to_string(),
                task_id: task.id.clone(),
                duration_ms: STEP_DURATION_MS,
                success: step_success,
            }));
        }

        let report = match &self.harness {
            Some(harness) => Some(harness.generate_report(&telemetry.events())?),
            None => None,
        };

        Ok(ExecutionOutcome {
            crv_results,
            policy_results,
            report,
        })
    }

    /// Evaluate a single action against the policy guard, outside any
    /// task graph.
    pub async fn simulate_policy(
        &self,
        request: &PolicySimulationRequest,
    ) -> Result<PolicySimulationResult, RunnerError> {
        let guard = self.guard.as_ref().ok_or(RunnerError::GuardUnavailable)?;
        let principal = request
            .principal
            .clone()
            .unwrap_or_else(Principal::test_agent);
        let decision = guard.evaluate(&principal, &request.action).await?;
        let tier = request.action.risk_tier;

        Ok(PolicySimulationResult {
            approval_path: approval::approval_path(tier, &decision),
            estimated_approval_time: approval::estimated_approval_time(tier, &decision),
            decision,
            timestamp: Utc::now(),
        })
    }

    pub fn get_test_result(&self, execution_id: &str) -> Option<TestResult> {
        self.store.get(execution_id)
    }

    pub fn get_all_test_results(&self) -> Vec<TestResult> {
        self.store.list()
    }

    pub fn get_artifact(&self, execution_id: &str, artifact_id: Uuid) -> Option<TestArtifact> {
        self.store
            .get(execution_id)?
            .artifacts
            .into_iter()
            .find(|a| a.id == artifact_id)
    }
}

/// Compare the run against the expected outcome; unset expectations are
/// wildcards. With no expectation at all, the aggregates themselves
/// decide.
fn determine_test_status(
    expected: Option<&ExpectedOutcome>,
    crv_results: &[CrvTestResult],
    policy_results: &[PolicyTestResult],
) -> TestStatus {
    let crv_ok = crv_results.iter().all(|r| r.passed);
    let policy_ok = policy_results
        .iter()
        .all(|r| r.decision.allowed || r.decision.requires_human_approval);
    let overall = crv_ok && policy_ok;

    let matched = match expected {
        None => overall,
        Some(exp) => {
            exp.crv_validation.is_none_or(|want| want == crv_ok)
                && exp.policy_approval.is_none_or(|want| want == policy_ok)
                && exp.should_pass.is_none_or(|want| want == overall)
        }
    };
    if matched {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    }
}
