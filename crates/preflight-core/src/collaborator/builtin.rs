//! Built-in simulation collaborators.
//!
//! These honor the same contracts a production gate/guard/checker would,
//! with deterministic behavior suitable for dry runs and tests: the gate
//! passes or fails uniformly, the guard decides purely from the risk tier,
//! and the checker interprets safety-rule tags with a static tool risk
//! table.

use chrono::Utc;

use preflight_types::crv::{Commit, GateConfig, GateResult, ValidatorResult};
use preflight_types::policy::{Action, GuardDecision, Principal};
use preflight_types::telemetry::{TelemetryEvent, TelemetryEventKind};
use preflight_types::testing::EvaluationReport;
use preflight_types::workflow::{RiskTier, SafetyPolicy, WorkflowSpec};

use super::{
    BoxFuture, CheckerFinding, CheckerReport, CollaboratorError, EvaluationHarness, PolicyGuard,
    Severity, VerificationGate, WorkflowChecker,
};

// ---------------------------------------------------------------------------
// FixedOutcomeGate
// ---------------------------------------------------------------------------

/// Gate engine that resolves every validator to a fixed outcome.
#[derive(Debug, Clone)]
pub struct FixedOutcomeGate {
    outcome: bool,
    confidence: f64,
}

impl FixedOutcomeGate {
    /// A gate where every validator passes with the given confidence.
    pub fn passing() -> Self {
        Self {
            outcome: true,
            confidence: 0.95,
        }
    }

    /// A gate where every validator fails.
    pub fn failing() -> Self {
        Self {
            outcome: false,
            confidence: 0.2,
        }
    }

    /// Override the reported confidence (clamped to `[0, 1]`).
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

impl VerificationGate for FixedOutcomeGate {
    fn validate<'a>(
        &'a self,
        _commit: &'a Commit,
        gate: &'a GateConfig,
    ) -> BoxFuture<'a, Result<GateResult, CollaboratorError>> {
        Box::pin(async move {
            let validation_results: Vec<ValidatorResult> = gate
                .validators
                .iter()
                .map(|validator| ValidatorResult {
                    valid: self.outcome,
                    reason: (!self.outcome)
                        .then(|| format!("validator '{validator}' rejected the commit")),
                    confidence: Some(self.confidence),
                })
                .collect();

            // A confidence floor in the gate config can fail an otherwise
            // passing run.
            let confident = gate
                .required_confidence
                .is_none_or(|floor| self.confidence >= floor);
            let passed = self.outcome && confident;

            Ok(GateResult {
                passed,
                gate_name: gate.name.clone(),
                validation_results,
                blocked_commit: !passed && gate.block_on_failure,
                timestamp: Utc::now(),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// RiskTierGuard
// ---------------------------------------------------------------------------

/// Policy guard deciding purely from the action's risk tier:
/// LOW/MEDIUM auto-allow, HIGH allow with human approval, CRITICAL deny
/// pending approval.
#[derive(Debug, Clone, Default)]
pub struct RiskTierGuard;

impl PolicyGuard for RiskTierGuard {
    fn evaluate<'a>(
        &'a self,
        _principal: &'a Principal,
        action: &'a Action,
    ) -> BoxFuture<'a, Result<GuardDecision, CollaboratorError>> {
        Box::pin(async move {
            let decision = match action.risk_tier {
                RiskTier::Low | RiskTier::Medium => GuardDecision {
                    allowed: true,
                    reason: format!("{} risk action within automatic threshold", action.risk_tier),
                    requires_human_approval: false,
                    approval_token: None,
                },
                RiskTier::High => GuardDecision {
                    allowed: true,
                    reason: "HIGH risk action requires review before execution".to_string(),
                    requires_human_approval: true,
                    approval_token: Some(format!("appr_{}", action.id)),
                },
                RiskTier::Critical => GuardDecision {
                    allowed: false,
                    reason: "CRITICAL risk action held pending human approval".to_string(),
                    requires_human_approval: true,
                    approval_token: Some(format!("appr_{}", action.id)),
                },
            };
            Ok(decision)
        })
    }
}

// ---------------------------------------------------------------------------
// RuleChecker
// ---------------------------------------------------------------------------

/// Risk scores per known tool, 0-100.
const TOOL_RISKS: &[(&str, u8)] = &[
    ("read_document", 10),
    ("send_email", 25),
    ("create_task", 20),
    ("update_record", 35),
    ("delete_record", 85),
    ("delete_database", 95),
    ("execute_code", 90),
    ("modify_permissions", 80),
    ("transfer_funds", 95),
    ("access_admin", 85),
];

/// Risk for an unknown tool.
const UNKNOWN_TOOL_RISK: u8 = 50;

fn tool_risk_tier(tool_name: &str) -> RiskTier {
    let score = TOOL_RISKS
        .iter()
        .find(|(name, _)| *name == tool_name)
        .map(|(_, score)| *score)
        .unwrap_or(UNKNOWN_TOOL_RISK);
    match score {
        0..30 => RiskTier::Low,
        30..70 => RiskTier::Medium,
        70..90 => RiskTier::High,
        _ => RiskTier::Critical,
    }
}

/// Safety-rule engine interpreting `SafetyRule.rule_type` tags.
///
/// Supported tags: `missing_compensation`, `permission_required`,
/// `action_after_critical_without_approval`, `risk_tier_mismatch`.
/// Unknown tags produce a warning finding carrying the tag through.
#[derive(Debug, Clone, Default)]
pub struct RuleChecker;

impl RuleChecker {
    fn check_rule(spec: &WorkflowSpec, rule_type: &str, report: &mut CheckerReport) {
        match rule_type {
            "missing_compensation" => {
                for task in &spec.tasks {
                    if task.effective_risk_tier() >= RiskTier::High && !task.has_compensation() {
                        report.warnings.push(CheckerFinding {
                            task_ids: vec![task.id.clone()],
                            rule_type: rule_type.to_string(),
                            message: format!(
                                "{} risk task '{}' declares no compensation action",
                                task.effective_risk_tier(),
                                task.id
                            ),
                            severity: Severity::Warning,
                        });
                    }
                }
            }
            "permission_required" => {
                for task in &spec.tasks {
                    if task.effective_risk_tier() == RiskTier::Critical
                        && task.required_permissions.is_none()
                    {
                        report.violations.push(CheckerFinding {
                            task_ids: vec![task.id.clone()],
                            rule_type: rule_type.to_string(),
                            message: format!(
                                "CRITICAL task '{}' declares no required permissions",
                                task.id
                            ),
                            severity: Severity::Error,
                        });
                    }
                }
            }
            "action_after_critical_without_approval" => {
                for task in &spec.tasks {
                    for dep in spec.dependencies_of(&task.id) {
                        let Some(dep_task) = spec.task(dep) else {
                            continue;
                        };
                        if dep_task.effective_risk_tier() == RiskTier::Critical {
                            report.warnings.push(CheckerFinding {
                                task_ids: vec![task.id.clone(), dep_task.id.clone()],
                                rule_type: rule_type.to_string(),
                                message: format!(
                                    "task '{}' runs after CRITICAL task '{}' without an approval step",
                                    task.id, dep_task.id
                                ),
                                severity: Severity::Warning,
                            });
                        }
                    }
                }
            }
            "risk_tier_mismatch" => {
                for task in &spec.tasks {
                    let Some(tool) = task.tool_name.as_deref() else {
                        continue;
                    };
                    let expected = tool_risk_tier(tool);
                    if expected > task.effective_risk_tier() {
                        report.violations.push(CheckerFinding {
                            task_ids: vec![task.id.clone()],
                            rule_type: rule_type.to_string(),
                            message: format!(
                                "task '{}' uses tool '{}' (expected tier {}) but declares {}",
                                task.id,
                                tool,
                                expected,
                                task.effective_risk_tier()
                            ),
                            severity: Severity::Error,
                        });
                    }
                }
            }
            other => {
                report.warnings.push(CheckerFinding {
                    task_ids: vec![],
                    rule_type: other.to_string(),
                    message: format!("unsupported safety rule type '{other}' was not evaluated"),
                    severity: Severity::Warning,
                });
            }
        }
    }
}

impl WorkflowChecker for RuleChecker {
    fn validate(&self, spec: &WorkflowSpec, policy: &SafetyPolicy) -> CheckerReport {
        let mut report = CheckerReport::default();
        for rule in &policy.rules {
            Self::check_rule(spec, &rule.rule_type, &mut report);
            if policy.fail_fast == Some(true) && !report.violations.is_empty() {
                break;
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// BasicEvaluationHarness
// ---------------------------------------------------------------------------

/// Aggregates a run's telemetry into counts and pass rates.
#[derive(Debug, Clone, Default)]
pub struct BasicEvaluationHarness;

impl EvaluationHarness for BasicEvaluationHarness {
    fn generate_report(
        &self,
        events: &[TelemetryEvent],
    ) -> Result<EvaluationReport, CollaboratorError> {
        let mut report = EvaluationReport {
            generated_at: Utc::now(),
            total_events: events.len(),
            crv_gates_evaluated: 0,
            crv_gates_passed: 0,
            policy_checks: 0,
            policy_checks_cleared: 0,
            steps_completed: 0,
            steps_succeeded: 0,
        };

        for event in events {
            match &event.kind {
                TelemetryEventKind::CrvGateEvaluated { passed, .. } => {
                    report.crv_gates_evaluated += 1;
                    if *passed {
                        report.crv_gates_passed += 1;
                    }
                }
                TelemetryEventKind::PolicyChecked {
                    allowed,
                    requires_human_approval,
                    ..
                } => {
                    report.policy_checks += 1;
                    if *allowed || *requires_human_approval {
                        report.policy_checks_cleared += 1;
                    }
                }
                TelemetryEventKind::StepCompleted { success, .. } => {
                    report.steps_completed += 1;
                    if *success {
                        report.steps_succeeded += 1;
                    }
                }
                TelemetryEventKind::StepStarted { .. } => {}
            }
        }

        Ok(report)
    }

    fn export_report_markdown(&self, report: &EvaluationReport) -> String {
        format!(
            "# Simulation Evaluation Report\n\n\
             Generated: {}\n\n\
             | Metric | Value |\n\
             |---|---|\n\
             | Total events | {} |\n\
             | CRV gates evaluated | {} |\n\
             | CRV gates passed | {} |\n\
             | Policy checks | {} |\n\
             | Policy checks cleared | {} |\n\
             | Steps completed | {} |\n\
             | Steps succeeded | {} |\n",
            report.generated_at.to_rfc3339(),
            report.total_events,
            report.crv_gates_evaluated,
            report.crv_gates_passed,
            report.policy_checks,
            report.policy_checks_cleared,
            report.steps_completed,
            report.steps_succeeded,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_types::workflow::{SafetyRule, TaskSpec, TaskType};
    use serde_json::json;

    fn gate_config(block: bool, floor: Option<f64>) -> GateConfig {
        GateConfig {
            name: "test-gate".to_string(),
            validators: vec!["schema".to_string(), "balance".to_string()],
            block_on_failure: block,
            required_confidence: floor,
        }
    }

    fn commit() -> Commit {
        Commit {
            id: "t1_commit".to_string(),
            data: json!({}),
        }
    }

    fn task(id: &str, tier: Option<RiskTier>, tool: Option<&str>) -> TaskSpec {
        TaskSpec {
            id: id.to_string(),
            name: id.to_string(),
            task_type: TaskType::Action,
            risk_tier: tier,
            tool_name: tool.map(String::from),
            crv_gate: None,
            required_permissions: None,
            retry: None,
            compensation: None,
        }
    }

    fn spec(tasks: Vec<TaskSpec>, deps: &[(&str, &[&str])]) -> WorkflowSpec {
        WorkflowSpec {
            id: "wf".to_string(),
            name: "wf".to_string(),
            goal: None,
            tasks,
            dependencies: deps
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|d| d.to_string()).collect()))
                .collect(),
            safety_policy: None,
        }
    }

    fn policy(rules: &[&str], fail_fast: bool) -> SafetyPolicy {
        SafetyPolicy {
            name: "p".to_string(),
            description: None,
            rules: rules
                .iter()
                .map(|r| SafetyRule {
                    rule_type: r.to_string(),
                    description: None,
                })
                .collect(),
            fail_fast: Some(fail_fast),
        }
    }

    // -----------------------------------------------------------------------
    // FixedOutcomeGate
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn passing_gate_passes_all_validators() {
        let gate = FixedOutcomeGate::passing();
        let result = gate.validate(&commit(), &gate_config(true, None)).await.unwrap();
        assert!(result.passed);
        assert!(!result.blocked_commit);
        assert_eq!(result.gate_name, "test-gate");
        assert_eq!(result.validation_results.len(), 2);
        assert!(result.validation_results.iter().all(|v| v.valid));
    }

    #[tokio::test]
    async fn failing_gate_blocks_when_configured() {
        let gate = FixedOutcomeGate::failing();
        let result = gate.validate(&commit(), &gate_config(true, None)).await.unwrap();
        assert!(!result.passed);
        assert!(result.blocked_commit);
        assert!(result.validation_results[0].reason.is_some());
    }

    #[tokio::test]
    async fn failing_gate_does_not_block_without_flag() {
        let gate = FixedOutcomeGate::failing();
        let result = gate.validate(&commit(), &gate_config(false, None)).await.unwrap();
        assert!(!result.passed);
        assert!(!result.blocked_commit);
    }

    #[tokio::test]
    async fn confidence_floor_fails_a_passing_gate() {
        let gate = FixedOutcomeGate::passing().with_confidence(0.5);
        let result = gate.validate(&commit(), &gate_config(true, Some(0.9))).await.unwrap();
        assert!(!result.passed, "below-floor confidence must fail the gate");
        assert!(result.blocked_commit);
    }

    // -----------------------------------------------------------------------
    // RiskTierGuard
    // -----------------------------------------------------------------------

    async fn decide(tier: RiskTier) -> GuardDecision {
        let guard = RiskTierGuard;
        let action = Action {
            id: "a1".to_string(),
            name: "a1".to_string(),
            risk_tier: tier,
            required_permissions: vec![],
            tool_name: None,
        };
        guard
            .evaluate(&Principal::test_agent(), &action)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn low_and_medium_auto_allow() {
        for tier in [RiskTier::Low, RiskTier::Medium] {
            let d = decide(tier).await;
            assert!(d.allowed);
            assert!(!d.requires_human_approval);
            assert!(d.approval_token.is_none());
        }
    }

    #[tokio::test]
    async fn high_allows_with_approval() {
        let d = decide(RiskTier::High).await;
        assert!(d.allowed);
        assert!(d.requires_human_approval);
        assert_eq!(d.approval_token.as_deref(), Some("appr_a1"));
    }

    #[tokio::test]
    async fn critical_denies_pending_approval() {
        let d = decide(RiskTier::Critical).await;
        assert!(!d.allowed);
        assert!(d.requires_human_approval);
    }

    // -----------------------------------------------------------------------
    // RuleChecker
    // -----------------------------------------------------------------------

    #[test]
    fn tool_risk_tiers_from_table() {
        assert_eq!(tool_risk_tier("read_document"), RiskTier::Low);
        assert_eq!(tool_risk_tier("update_record"), RiskTier::Medium);
        assert_eq!(tool_risk_tier("modify_permissions"), RiskTier::High);
        assert_eq!(tool_risk_tier("transfer_funds"), RiskTier::Critical);
        assert_eq!(tool_risk_tier("mystery_tool"), RiskTier::Medium);
    }

    #[test]
    fn risk_tier_mismatch_flags_understated_tier() {
        let s = spec(
            vec![task("charge", Some(RiskTier::Low), Some("transfer_funds"))],
            &[],
        );
        let report = RuleChecker.validate(&s, &policy(&["risk_tier_mismatch"], false));
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].severity, Severity::Error);
        assert!(report.violations[0].message.contains("transfer_funds"));
    }

    #[test]
    fn missing_compensation_is_a_warning() {
        let s = spec(vec![task("risky", Some(RiskTier::High), None)], &[]);
        let report = RuleChecker.validate(&s, &policy(&["missing_compensation"], false));
        assert!(report.violations.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn permission_required_is_an_error_for_critical() {
        let s = spec(vec![task("nuke", Some(RiskTier::Critical), None)], &[]);
        let report = RuleChecker.validate(&s, &policy(&["permission_required"], false));
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn action_after_critical_warns_on_dependents() {
        let s = spec(
            vec![
                task("nuke", Some(RiskTier::Critical), None),
                task("next", None, None),
            ],
            &[("next", &["nuke"])],
        );
        let report = RuleChecker.validate(
            &s,
            &policy(&["action_after_critical_without_approval"], false),
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].task_ids, vec!["next", "nuke"]);
    }

    #[test]
    fn unknown_rule_type_passes_through_as_warning() {
        let s = spec(vec![task("a", None, None)], &[]);
        let report = RuleChecker.validate(&s, &policy(&["quantum_entanglement"], false));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].rule_type, "quantum_entanglement");
    }

    #[test]
    fn fail_fast_stops_after_first_violation() {
        let s = spec(
            vec![task("nuke", Some(RiskTier::Critical), Some("transfer_funds"))],
            &[],
        );
        // Both rules would produce a violation; fail_fast keeps only the first.
        let report = RuleChecker.validate(
            &s,
            &policy(&["permission_required", "risk_tier_mismatch"], true),
        );
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_type, "permission_required");
    }

    // -----------------------------------------------------------------------
    // BasicEvaluationHarness
    // -----------------------------------------------------------------------

    #[test]
    fn harness_counts_event_kinds() {
        let events = vec![
            TelemetryEvent::now(TelemetryEventKind::CrvGateEvaluated {
                execution_id: "e".to_string(),
                task_id: "t".to_string(),
                gate_name: "g".to_string(),
                passed: true,
                blocked_commit: false,
            }),
            TelemetryEvent::now(TelemetryEventKind::PolicyChecked {
                execution_id: "e".to_string(),
                task_id: "t".to_string(),
                action_id: "t".to_string(),
                risk_tier: RiskTier::High,
                allowed: true,
                requires_human_approval: true,
            }),
            TelemetryEvent::now(TelemetryEventKind::StepCompleted {
                execution_id: "e".to_string(),
                task_id: "t".to_string(),
                duration_ms: 100,
                success: false,
            }),
        ];
        let report = BasicEvaluationHarness.generate_report(&events).unwrap();
        assert_eq!(report.total_events, 3);
        assert_eq!(report.crv_gates_evaluated, 1);
        assert_eq!(report.crv_gates_passed, 1);
        assert_eq!(report.policy_checks, 1);
        assert_eq!(report.policy_checks_cleared, 1);
        assert_eq!(report.steps_completed, 1);
        assert_eq!(report.steps_succeeded, 0);

        let markdown = BasicEvaluationHarness.export_report_markdown(&report);
        assert!(markdown.starts_with("# Simulation Evaluation Report"));
        assert!(markdown.contains("| Total events | 3 |"));
    }
}
