//! Artifact construction for simulation runs.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use preflight_types::testing::{
    ArtifactType, CrvTestResult, EvaluationReport, PolicyTestResult, TestArtifact,
};

use crate::collaborator::EvaluationHarness;
use crate::telemetry::{TelemetryBuffer, TelemetrySink};

fn artifact(artifact_type: ArtifactType, name: &str, content: String) -> TestArtifact {
    TestArtifact {
        id: Uuid::now_v7(),
        artifact_type,
        name: name.to_string(),
        content,
        created_at: Utc::now(),
    }
}

/// Build the run's artifact set.
///
/// `events_log` and `telemetry` are always produced, even when the run
/// errored, from whatever the buffer accumulated. The report artifacts
/// exist only when a harness produced a report.
pub fn build_artifacts(
    execution_id: &str,
    crv_results: &[CrvTestResult],
    policy_results: &[PolicyTestResult],
    report: Option<&EvaluationReport>,
    harness: Option<&dyn EvaluationHarness>,
    telemetry: &TelemetryBuffer,
) -> Vec<TestArtifact> {
    let mut artifacts = Vec::with_capacity(4);
    let events = telemetry.events();

    if let Some(report) = report {
        artifacts.push(artifact(
            ArtifactType::ReportJson,
            "evaluation_report.json",
            serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        ));
        if let Some(harness) = harness {
            artifacts.push(artifact(
                ArtifactType::ReportMarkdown,
                "evaluation_report.md",
                harness.export_report_markdown(report),
            ));
        }
    }

    artifacts.push(artifact(
        ArtifactType::EventsLog,
        "events.json",
        serde_json::to_string_pretty(&events).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
    ));

    let summary = json!({
        "execution_id": execution_id,
        "event_count": events.len(),
        "crv_results": crv_results,
        "policy_results": policy_results,
    });
    artifacts.push(artifact(
        ArtifactType::Telemetry,
        "telemetry.json",
        serde_json::to_string_pretty(&summary).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
    ));

    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_types::telemetry::{TelemetryEvent, TelemetryEventKind};

    use crate::collaborator::builtin::BasicEvaluationHarness;

    fn buffer_with_event() -> TelemetryBuffer {
        let buffer = TelemetryBuffer::new();
        buffer.record_event(TelemetryEvent::now(TelemetryEventKind::StepStarted {
            execution_id: "exec".to_string(),
            task_id: "a".to_string(),
            task_name: "A".to_string(),
        }));
        buffer
    }

    #[test]
    fn always_produces_events_log_and_telemetry() {
        let buffer = buffer_with_event();
        let artifacts = build_artifacts("exec", &[], &[], None, None, &buffer);
        let types: Vec<_> = artifacts.iter().map(|a| a.artifact_type).collect();
        assert_eq!(types, [ArtifactType::EventsLog, ArtifactType::Telemetry]);
        assert!(artifacts[0].content.contains("step_started"));
        assert!(artifacts[1].content.contains("\"event_count\": 1"));
    }

    #[test]
    fn report_artifacts_appear_with_a_harness_report() {
        let buffer = buffer_with_event();
        let harness = BasicEvaluationHarness;
        let report = harness.generate_report(&buffer.events()).unwrap();
        let artifacts = build_artifacts("exec", &[], &[], Some(&report), Some(&harness), &buffer);
        let types: Vec<_> = artifacts.iter().map(|a| a.artifact_type).collect();
        assert_eq!(
            types,
            [
                ArtifactType::ReportJson,
                ArtifactType::ReportMarkdown,
                ArtifactType::EventsLog,
                ArtifactType::Telemetry
            ]
        );
        assert!(artifacts[1].content.starts_with("# Simulation Evaluation Report"));
    }

    #[test]
    fn artifacts_have_unique_ids() {
        let buffer = TelemetryBuffer::new();
        let artifacts = build_artifacts("exec", &[], &[], None, None, &buffer);
        assert_ne!(artifacts[0].id, artifacts[1].id);
    }
}
