//! Telemetry events emitted during simulated execution.
//!
//! Every event is timestamped and carries a tagged payload. Simulation runs
//! write into a test-scoped buffer that is serialized verbatim into the
//! `events_log` artifact, so these types are the audit wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::RiskTier;

/// A timestamped structured event accepted by the telemetry sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: TelemetryEventKind,
}

impl TelemetryEvent {
    /// Stamp an event with the current time.
    pub fn now(kind: TelemetryEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Event payloads emitted by the simulation runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEventKind {
    /// A CRV gate was evaluated for a task.
    CrvGateEvaluated {
        execution_id: String,
        task_id: String,
        gate_name: String,
        passed: bool,
        blocked_commit: bool,
    },

    /// The policy guard evaluated a task's synthetic action.
    PolicyChecked {
        execution_id: String,
        task_id: String,
        action_id: String,
        risk_tier: RiskTier,
        allowed: bool,
        requires_human_approval: bool,
    },

    /// A simulated step began.
    StepStarted {
        execution_id: String,
        task_id: String,
        task_name: String,
    },

    /// A simulated step finished.
    StepCompleted {
        execution_id: String,
        task_id: String,
        duration_ms: u64,
        success: bool,
    },
}
