//! Trace sink boundary and trace levels

use std::sync::Mutex;

/// Granularity of tracing the host has enabled.
///
/// Framework-level profiling only runs when the active level is at or above
/// [`TraceLevel::Framework`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    /// No tracing
    Disabled,
    /// Application-level spans only
    Application,
    /// Model load/predict spans
    Model,
    /// Framework internals, including engine profiles
    Framework,
    /// Everything
    Full,
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::Application
    }
}

/// Whether an event opens or closes a traced operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    Start,
    End,
}

/// One span boundary record emitted by the predictor
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// Operation name ("Download", "LoadPredictor", "Predict")
    pub name: String,

    /// Start or end of the operation
    pub phase: TracePhase,

    /// URL/path/graph tags attached to the operation
    pub attributes: Vec<(String, String)>,
}

impl TraceEvent {
    /// Create a start event
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: TracePhase::Start,
            attributes: Vec::new(),
        }
    }

    /// Create an end event
    pub fn end(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: TracePhase::End,
            attributes: Vec::new(),
        }
    }

    /// Attach a key/value attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Sink consuming span records and profile publications from the predictor
pub trait TraceSink: Send + Sync {
    /// Record one span boundary
    fn record_event(&self, event: TraceEvent);

    /// Publish one parsed engine profile
    fn publish_profile(&self, profile: &crate::profile::ProfileRecord);
}

/// Default sink that forwards everything to `tracing`
pub struct LogSink;

impl TraceSink for LogSink {
    fn record_event(&self, event: TraceEvent) {
        tracing::info!(
            name = %event.name,
            phase = ?event.phase,
            attributes = ?event.attributes,
            "trace event"
        );
    }

    fn publish_profile(&self, profile: &crate::profile::ProfileRecord) {
        tracing::info!(
            entries = profile.entries.len(),
            duration_us = profile.total_duration_us(),
            "engine profile"
        );
    }
}

/// Sink that captures everything in memory, for tests
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
    profiles: Mutex<Vec<crate::profile::ProfileRecord>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// All profiles published so far
    pub fn profiles(&self) -> Vec<crate::profile::ProfileRecord> {
        self.profiles.lock().unwrap().clone()
    }
}

impl TraceSink for RecordingSink {
    fn record_event(&self, event: TraceEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn publish_profile(&self, profile: &crate::profile::ProfileRecord) {
        self.profiles.lock().unwrap().push(profile.clone());
    }
}
