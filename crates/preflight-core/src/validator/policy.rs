//! Safety-policy validation.
//!
//! Rule evaluation is delegated to a [`WorkflowChecker`] when a policy is
//! supplied; its tag-based findings are remapped into [`PolicyRuleKind`].
//! Three local heuristics run regardless, so a workflow with no policy
//! attached still gets risk-posture feedback.

use serde::{Deserialize, Serialize};
use tracing::debug;

use preflight_types::workflow::{RiskTier, SafetyPolicy, WorkflowSpec};

use crate::collaborator::{CheckerFinding, Severity, WorkflowChecker};

/// Recognized policy rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRuleKind {
    ActionAfterCriticalWithoutApproval,
    PermissionRequired,
    MissingCompensation,
    RiskTierMismatch,
}

impl PolicyRuleKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "action_after_critical_without_approval" => {
                Some(Self::ActionAfterCriticalWithoutApproval)
            }
            "permission_required" => Some(Self::PermissionRequired),
            "missing_compensation" => Some(Self::MissingCompensation),
            "risk_tier_mismatch" => Some(Self::RiskTierMismatch),
            _ => None,
        }
    }
}

/// A policy finding severe enough to carry a severity of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub kind: PolicyRuleKind,
    pub task_ids: Vec<String>,
    pub message: String,
    pub severity: Severity,
}

/// An advisory policy finding. `kind` is `None` for findings whose
/// rule-type tag is not a recognized category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyWarning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PolicyRuleKind>,
    pub task_ids: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Outcome of policy validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyReport {
    pub valid: bool,
    pub violations: Vec<PolicyViolation>,
    pub warnings: Vec<PolicyWarning>,
}

/// Validate a workflow against its safety policy.
///
/// `safety_policy` overrides the one embedded in the spec when given.
/// The report is valid iff no error-severity violation was found.
pub fn validate_policy(
    spec: &WorkflowSpec,
    checker: Option<&dyn WorkflowChecker>,
    safety_policy: Option<&SafetyPolicy>,
) -> PolicyReport {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    let policy = safety_policy.or(spec.safety_policy.as_ref());
    if let (Some(checker), Some(policy)) = (checker, policy) {
        let report = checker.validate(spec, policy);
        for finding in report.violations {
            remap_finding(finding, &mut violations, &mut warnings);
        }
        for finding in report.warnings {
            remap_finding(finding, &mut violations, &mut warnings);
        }
    }

    apply_heuristics(spec, &mut warnings);

    let valid = !violations.iter().any(|v| v.severity == Severity::Error);
    debug!(
        workflow = %spec.id,
        violations = violations.len(),
        warnings = warnings.len(),
        valid,
        "policy validation finished"
    );

    PolicyReport {
        valid,
        violations,
        warnings,
    }
}

/// Route a checker finding into the report. Error-severity findings with
/// a recognized tag become violations; everything else becomes a
/// warning, preserving an unrecognized tag in the message.
fn remap_finding(
    finding: CheckerFinding,
    violations: &mut Vec<PolicyViolation>,
    warnings: &mut Vec<PolicyWarning>,
) {
    let kind = PolicyRuleKind::from_tag(&finding.rule_type);
    match (kind, finding.severity) {
        (Some(kind), Severity::Error) => violations.push(PolicyViolation {
            kind,
            task_ids: finding.task_ids,
            message: finding.message,
            severity: Severity::Error,
        }),
        (kind, _) => warnings.push(PolicyWarning {
            kind,
            task_ids: finding.task_ids,
            message: match kind {
                Some(_) => finding.message,
                None => format!("[{}] {}", finding.rule_type, finding.message),
            },
            remediation: None,
        }),
    }
}

/// The three always-on heuristics. Skips any warning the checker already
/// produced for the same rule kind and task set.
fn apply_heuristics(spec: &WorkflowSpec, warnings: &mut Vec<PolicyWarning>) {
    let push = |warnings: &mut Vec<PolicyWarning>, warning: PolicyWarning| {
        let duplicate = warnings
            .iter()
            .any(|w| w.kind == warning.kind && w.task_ids == warning.task_ids);
        if !duplicate {
            warnings.push(warning);
        }
    };

    for task in &spec.tasks {
        let tier = task.effective_risk_tier();

        if tier >= RiskTier::High && !task.has_compensation() {
            push(
                warnings,
                PolicyWarning {
                    kind: Some(PolicyRuleKind::MissingCompensation),
                    task_ids: vec![task.id.clone()],
                    message: format!(
                        "{tier} risk task '{}' has no compensation action",
                        task.id
                    ),
                    remediation: Some(format!(
                        "add an on_failure compensation hook to task '{}'",
                        task.id
                    )),
                },
            );
        }

        if tier == RiskTier::Critical && task.required_permissions.is_none() {
            push(
                warnings,
                PolicyWarning {
                    kind: Some(PolicyRuleKind::PermissionRequired),
                    task_ids: vec![task.id.clone()],
                    message: format!(
                        "CRITICAL task '{}' declares no required permissions",
                        task.id
                    ),
                    remediation: Some(format!(
                        "declare required_permissions on task '{}'",
                        task.id
                    )),
                },
            );
        }

        for dep in spec.dependencies_of(&task.id) {
            let Some(dep_task) = spec.task(dep) else {
                continue;
            };
            if dep_task.effective_risk_tier() == RiskTier::Critical {
                push(
                    warnings,
                    PolicyWarning {
                        kind: Some(PolicyRuleKind::ActionAfterCriticalWithoutApproval),
                        task_ids: vec![task.id.clone(), dep_task.id.clone()],
                        message: format!(
                            "task '{}' runs after CRITICAL task '{}' with no approval step between them",
                            task.id, dep_task.id
                        ),
                        remediation: Some(
                            "insert a decision task requiring human approval".to_string(),
                        ),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use preflight_types::workflow::{
        CompensationAction, CompensationHook, SafetyRule, TaskSpec, TaskType,
    };

    use crate::collaborator::CheckerReport;
    use crate::collaborator::builtin::RuleChecker;

    fn task(id: &str, tier: Option<RiskTier>) -> TaskSpec {
        TaskSpec {
            id: id.to_string(),
            name: id.to_string(),
            task_type: TaskType::Action,
            risk_tier: tier,
            tool_name: None,
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

    fn policy(rules: &[&str]) -> SafetyPolicy {
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
            fail_fast: None,
        }
    }

    #[test]
    fn low_risk_workflow_has_no_findings() {
        let s = spec(vec![task("a", Some(RiskTier::Low))], &[]);
        let report = validate_policy(&s, None, None);
        assert!(report.valid);
        assert!(report.violations.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn high_task_without_compensation_warns() {
        let s = spec(vec![task("risky", Some(RiskTier::High))], &[]);
        let report = validate_policy(&s, None, None);
        assert!(report.valid, "heuristic warnings never invalidate");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.warnings[0].kind,
            Some(PolicyRuleKind::MissingCompensation)
        );
        assert!(report.warnings[0].remediation.is_some());
    }

    #[test]
    fn compensated_high_task_does_not_warn() {
        let mut t = task("risky", Some(RiskTier::High));
        t.compensation = Some(CompensationHook {
            on_failure: Some(CompensationAction {
                tool: "rollback".to_string(),
                args: HashMap::new(),
            }),
            on_timeout: None,
        });
        let report = validate_policy(&spec(vec![t], &[]), None, None);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn critical_task_collects_both_heuristics() {
        let s = spec(vec![task("nuke", Some(RiskTier::Critical))], &[]);
        let report = validate_policy(&s, None, None);
        let kinds: Vec<_> = report.warnings.iter().filter_map(|w| w.kind).collect();
        assert!(kinds.contains(&PolicyRuleKind::MissingCompensation));
        assert!(kinds.contains(&PolicyRuleKind::PermissionRequired));
    }

    #[test]
    fn dependent_of_critical_task_warns() {
        let s = spec(
            vec![task("nuke", Some(RiskTier::Critical)), task("after", None)],
            &[("after", &["nuke"])],
        );
        let report = validate_policy(&s, None, None);
        assert!(report.warnings.iter().any(|w| {
            w.kind == Some(PolicyRuleKind::ActionAfterCriticalWithoutApproval)
                && w.task_ids == vec!["after", "nuke"]
        }));
    }

    #[test]
    fn checker_error_invalidates_the_report() {
        let mut t = task("charge", Some(RiskTier::Low));
        t.tool_name = Some("transfer_funds".to_string());
        let s = spec(vec![t], &[]);
        let report = validate_policy(&s, Some(&RuleChecker), Some(&policy(&["risk_tier_mismatch"])));
        assert!(!report.valid);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, PolicyRuleKind::RiskTierMismatch);
    }

    #[test]
    fn unknown_checker_tag_becomes_tagged_warning() {
        struct OddChecker;
        impl WorkflowChecker for OddChecker {
            fn validate(&self, _spec: &WorkflowSpec, _policy: &SafetyPolicy) -> CheckerReport {
                CheckerReport {
                    violations: vec![CheckerFinding {
                        task_ids: vec!["a".to_string()],
                        rule_type: "budget_exceeded".to_string(),
                        message: "spend over limit".to_string(),
                        severity: Severity::Error,
                    }],
                    warnings: vec![],
                }
            }
        }
        let s = spec(vec![task("a", Some(RiskTier::Low))], &[]);
        let report = validate_policy(&s, Some(&OddChecker), Some(&policy(&["budget_exceeded"])));
        assert!(report.valid, "unrecognized rules are advisory");
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("[budget_exceeded]"));
        assert!(report.warnings[0].kind.is_none());
    }

    #[test]
    fn checker_and_heuristic_findings_are_deduplicated() {
        let s = spec(vec![task("risky", Some(RiskTier::High))], &[]);
        let report = validate_policy(&s, Some(&RuleChecker), Some(&policy(&["missing_compensation"])));
        let compensation_warnings = report
            .warnings
            .iter()
            .filter(|w| w.kind == Some(PolicyRuleKind::MissingCompensation))
            .count();
        assert_eq!(compensation_warnings, 1);
    }

    #[test]
    fn explicit_policy_overrides_embedded_one() {
        let mut s = spec(vec![task("a", Some(RiskTier::Low))], &[]);
        s.safety_policy = Some(policy(&["permission_required"]));
        let override_policy = policy(&["unheard_of_rule"]);
        let report = validate_policy(&s, Some(&RuleChecker), Some(&override_policy));
        // The override's unknown rule surfaces; the embedded policy's rule
        // does not run.
        assert!(report.warnings.iter().any(|w| w.message.contains("unheard_of_rule")));
    }
}
