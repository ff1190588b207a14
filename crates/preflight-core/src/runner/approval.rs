//! Fixed approval-path and approval-time tables.
//!
//! These are deterministic lookups keyed by risk tier, gated on whether
//! the guard decision actually requires approval.

use preflight_types::policy::GuardDecision;
use preflight_types::workflow::RiskTier;

/// The ladder applies only when the guard asked for a human; a denial
/// without that flag is final and clears automatically.
fn needs_approval(decision: &GuardDecision) -> bool {
    decision.requires_human_approval
}

/// Ordered approver roles an action must pass through.
///
/// `["Automatic approval"]` when the decision clears without review.
pub fn approval_path(tier: RiskTier, decision: &GuardDecision) -> Vec<String> {
    if !needs_approval(decision) {
        return vec!["Automatic approval".to_string()];
    }
    let roles: &[&str] = match tier {
        RiskTier::Critical => &["Senior Engineer", "Tech Lead", "Director"],
        RiskTier::High => &["Senior Engineer", "Tech Lead"],
        RiskTier::Medium => &["Senior Engineer"],
        RiskTier::Low => &["Any Engineer"],
    };
    roles.iter().map(|r| r.to_string()).collect()
}

/// Fixed wall-clock estimate for clearing the approval path.
pub fn estimated_approval_time(tier: RiskTier, decision: &GuardDecision) -> String {
    if !needs_approval(decision) {
        return "Immediate".to_string();
    }
    match tier {
        RiskTier::Critical => "24-48 hours",
        RiskTier::High => "4-8 hours",
        RiskTier::Medium => "1-2 hours",
        RiskTier::Low => "< 1 hour",
    }
    .to_string()
}
