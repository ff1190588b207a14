//! Policy guard types: principals, actions, and guard decisions.
//!
//! The policy guard is a risk-tier-aware authorization engine evaluated as
//! an external collaborator; these types define its contract.

use serde::{Deserialize, Serialize};

use crate::workflow::RiskTier;

/// Permission requirement for task execution and action authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Action identifier (e.g. "payments.charge").
    pub action: String,
    /// Resource identifier (e.g. "billing").
    pub resource: String,
}

/// The kind of actor attempting an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    Agent,
    Human,
    Service,
}

/// An actor attempting an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// The fixed synthetic principal used by the simulation runner.
    pub fn test_agent() -> Self {
        Self {
            id: "test_agent".to_string(),
            principal_type: PrincipalType::Agent,
            permissions: Vec::new(),
        }
    }
}

/// An action with its risk classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub name: String,
    pub risk_tier: RiskTier,
    #[serde(default)]
    pub required_permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

/// Decision returned by the policy guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardDecision {
    /// Whether the action is allowed to proceed.
    pub allowed: bool,
    /// Decision reason.
    pub reason: String,
    /// Whether a human must approve before execution.
    pub requires_human_approval: bool,
    /// Approval token, when one was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_principal_shape() {
        let p = Principal::test_agent();
        assert_eq!(p.id, "test_agent");
        assert_eq!(p.principal_type, PrincipalType::Agent);
        assert!(p.permissions.is_empty());
    }

    #[test]
    fn guard_decision_json_roundtrip() {
        let decision = GuardDecision {
            allowed: true,
            reason: "within tier threshold".to_string(),
            requires_human_approval: true,
            approval_token: Some("tok-123".to_string()),
        };
        let json = serde_json::to_string(&decision).unwrap();
        let parsed: GuardDecision = serde_json::from_str(&json).unwrap();
        assert!(parsed.allowed);
        assert!(parsed.requires_human_approval);
        assert_eq!(parsed.approval_token.as_deref(), Some("tok-123"));
    }

    #[test]
    fn action_serde_with_tier() {
        let action = Action {
            id: "charge".to_string(),
            name: "Charge Cards".to_string(),
            risk_tier: RiskTier::Critical,
            required_permissions: vec![Permission {
                action: "payments.charge".to_string(),
                resource: "billing".to_string(),
            }],
            tool_name: Some("transfer_funds".to_string()),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"CRITICAL\""));
        let parsed: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.required_permissions.len(), 1);
    }
}
