//! CRV gate coverage validation.
//!
//! Purely advisory: a HIGH or CRITICAL task without a verification gate
//! is a risk-posture gap, not a deployment blocker.

use serde::{Deserialize, Serialize};

use preflight_types::workflow::{RiskTier, WorkflowSpec};

use super::{ValidationWarning, ValidationWarningKind};

/// Outcome of CRV coverage validation. Always valid; only warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrvReport {
    pub valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

/// Warn for each HIGH or CRITICAL task that declares no `crv_gate`.
pub fn validate_crv_rules(spec: &WorkflowSpec) -> CrvReport {
    let warnings = spec
        .tasks
        .iter()
        .filter(|t| t.effective_risk_tier() >= RiskTier::High && t.crv_gate.is_none())
        .map(|t| ValidationWarning {
            kind: ValidationWarningKind::MissingCrvGate,
            task_id: Some(t.id.clone()),
            message: format!(
                "{} risk task '{}' has no CRV gate",
                t.effective_risk_tier(),
                t.id
            ),
            remediation: Some(format!(
                "attach a crv_gate with block_on_failure to task '{}'",
                t.id
            )),
        })
        .collect();

    CrvReport {
        valid: true,
        warnings,
    }
}
