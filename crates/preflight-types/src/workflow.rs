//! Workflow specification types for Preflight.
//!
//! `WorkflowSpec` is the declarative task graph handed to the DAG validator
//! and embedded (in plain-data form) in simulation test cases. The spec is
//! authored externally (YAML or JSON) and is never mutated here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crv::GateConfig;
use crate::policy::Permission;

// ---------------------------------------------------------------------------
// Risk tiers
// ---------------------------------------------------------------------------

/// Ordinal risk classification driving approval and compensation requirements.
///
/// Derives `Ord` so tiers can be compared directly (`tier >= RiskTier::High`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// The tier assumed downstream when a task declares none.
    pub const DEFAULT: RiskTier = RiskTier::Medium;
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Task specification
// ---------------------------------------------------------------------------

/// The kind of task in a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Action,
    Decision,
    Parallel,
}

/// Retry configuration for a task.
///
/// Carried as data for the execution engine; the verification core parses
/// it but never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts (>= 1).
    pub max_attempts: u32,
    /// Initial backoff in milliseconds.
    pub backoff_ms: u64,
    /// Backoff multiplier applied per attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<f64>,
    /// Whether to add jitter to backoff delays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<bool>,
}

/// Compensation action to run when a task fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationAction {
    /// Tool to execute.
    pub tool: String,
    /// Tool arguments.
    #[serde(default)]
    pub args: HashMap<String, Value>,
}

/// Compensation hooks for task failures and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationHook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<CompensationAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<CompensationAction>,
}

/// One executable unit within a workflow.
///
/// A single tagged structure with explicit optional fields, validated once
/// at the `WorkflowSpec` boundary. Validators and the simulation runner
/// read these fields directly; there is no dynamic field access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task identifier within the workflow.
    pub id: String,
    /// Human-readable task name.
    pub name: String,
    /// The kind of task.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Risk tier; absent means `RiskTier::DEFAULT` downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<RiskTier>,
    /// Tool this task invokes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// CRV gate configuration; presence makes the simulation runner
    /// exercise the verification gate for this task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv_gate: Option<GateConfig>,
    /// Permissions this task requires at execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_permissions: Option<Vec<Permission>>,
    /// Retry configuration (data only, not interpreted by this core).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    /// Compensation hooks; their absence on HIGH/CRITICAL tasks is a
    /// policy warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<CompensationHook>,
}

impl TaskSpec {
    /// The effective risk tier: declared, or `RiskTier::DEFAULT` when absent.
    pub fn effective_risk_tier(&self) -> RiskTier {
        self.risk_tier.unwrap_or(RiskTier::DEFAULT)
    }

    /// Whether any compensation action is declared.
    pub fn has_compensation(&self) -> bool {
        self.compensation
            .as_ref()
            .is_some_and(|c| c.on_failure.is_some() || c.on_timeout.is_some())
    }
}

// ---------------------------------------------------------------------------
// Safety policy
// ---------------------------------------------------------------------------

/// One rule within a safety policy, identified by a rule-type tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRule {
    /// Rule type tag (e.g. "missing_compensation", "risk_tier_mismatch").
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named set of safety rules evaluated by a workflow checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyPolicy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<SafetyRule>,
    /// Stop at the first violation when true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
}

// ---------------------------------------------------------------------------
// Workflow specification
// ---------------------------------------------------------------------------

/// A declarative task graph.
///
/// Task ids must be unique and the dependency map's keys and values must
/// reference ids present in `tasks`; violations are reported by the DAG
/// validator, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Unique workflow identifier.
    pub id: String,
    /// Human-readable workflow name.
    pub name: String,
    /// Optional goal statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Ordered list of tasks forming the workflow DAG.
    pub tasks: Vec<TaskSpec>,
    /// Dependency map: task id -> ids of tasks it depends on.
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<String>>,
    /// Optional safety policy evaluated during policy validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_policy: Option<SafetyPolicy>,
}

impl WorkflowSpec {
    /// Dependencies declared for a task (empty slice when none).
    pub fn dependencies_of(&self, task_id: &str) -> &[String] {
        self.dependencies
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a task by id.
    pub fn task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
