/// Developer-facing log channel.
///
/// Configuration and layout problems are reported here instead of being
/// thrown: the chart degrades gracefully and the host decides what to do
/// with the messages. Events are recorded in emission order and can be
/// drained by the host after each draw cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    /// The pass or subsystem that emitted the event.
    pub source: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, severity: Severity, source: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            severity,
            source,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, source: &'static str, message: impl Into<String>) {
        self.emit(Severity::Warning, source, message);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, Severity};

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.warn("rescale", "unknown projection");
        bus.emit(Severity::Info, "draw", "frame done");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[0].source, "rescale");
        assert_eq!(bus.warnings().count(), 1);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.warn("layout", "container is too little or has no size");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
