//! Test-scoped telemetry buffer.
//!
//! Each simulation run creates a fresh `TelemetryBuffer`, isolated from any
//! process-wide collector, so simulated events never pollute production
//! telemetry. The buffer is re-read at the end of a run to build the
//! `events_log` artifact, which is why this is a buffer rather than a
//! broadcast channel.

use std::sync::Mutex;

use preflight_types::telemetry::TelemetryEvent;

/// Sink for timestamped structured events.
pub trait TelemetrySink: Send + Sync {
    /// Record one event.
    fn record_event(&self, event: TelemetryEvent);

    /// Snapshot of all events recorded so far, in record order.
    fn events(&self) -> Vec<TelemetryEvent>;
}

/// In-memory, append-only event buffer.
#[derive(Debug, Default)]
pub struct TelemetryBuffer {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl TelemetryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TelemetryEvent>> {
        // A poisoned lock only means a panicking writer; the buffer itself
        // is still consistent (push is atomic under the guard).
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TelemetrySink for TelemetryBuffer {
    fn record_event(&self, event: TelemetryEvent) {
        self.lock().push(event);
    }

    fn events(&self) -> Vec<TelemetryEvent> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_types::telemetry::TelemetryEventKind;

    fn step_event(task_id: &str) -> TelemetryEvent {
        TelemetryEvent::now(TelemetryEventKind::StepStarted {
            execution_id: "e1".to_string(),
            task_id: task_id.to_string(),
            task_name: task_id.to_string(),
        })
    }

    #[test]
    fn records_in_order() {
        let buffer = TelemetryBuffer::new();
        buffer.record_event(step_event("a"));
        buffer.record_event(step_event("b"));

        let events = buffer.events();
        assert_eq!(events.len(), 2);
        assert!(
            matches!(&events[0].kind, TelemetryEventKind::StepStarted { task_id, .. } if task_id == "a")
        );
        assert!(
            matches!(&events[1].kind, TelemetryEventKind::StepStarted { task_id, .. } if task_id == "b")
        );
    }

    #[test]
    fn fresh_buffer_is_empty() {
        let buffer = TelemetryBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.events().is_empty());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let buffer = TelemetryBuffer::new();
        buffer.record_event(step_event("a"));
        let snapshot = buffer.events();
        buffer.record_event(step_event("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }
}
