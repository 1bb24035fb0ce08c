//! Fire-and-forget telemetry sinks.

use std::cell::RefCell;

/// Emitted when a selected paragraph's text is already in the selection set.
pub const DUPLICATE_SELECTION_EVENT: &str =
    "Document representation fallback to text matching and duplicate paragraph texts";

/// Emitted when the rendered paragraph list and the host list disagree.
pub const RENDERED_DIVERGENCE_EVENT: &str = "Rendered paragraph list diverges from host paragraph list";

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn track_event(&self, _label: &str) {}
}

/// Keeps every event label in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    /// Labels received so far.
    events: RefCell<Vec<String>>,
}

impl RecordingTelemetry {
    /// Snapshot of the labels received so far.
    pub fn events(&self) -> Vec<String> {
        return self.events.borrow().clone();
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn track_event(&self, label: &str) {
        self.events.borrow_mut().push(label.to_string());
    }
}

/// Accepts a free-text event label. Must never block or fail the caller.
pub trait TelemetrySink {
    /// Record one event.
    fn track_event(&self, label: &str);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &T {
    fn track_event(&self, label: &str) {
        (**self).track_event(label);
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn track_event(&self, label: &str) {
        (**self).track_event(label);
    }
}

/// Forwards events to `tracing` at info level under the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn track_event(&self, label: &str) {
        tracing::info!(target: "paraprint::telemetry", event = label, "telemetry event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order() {
        let sink = RecordingTelemetry::default();
        sink.track_event("a");
        (&sink).track_event("b");
        assert_eq!(sink.events(), vec!["a".to_string(), "b".to_string()]);
    }
}
