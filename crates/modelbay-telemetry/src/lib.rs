//! ModelBay Telemetry
//!
//! Tracing and metrics surfaces for the ModelBay predictor platform.
//!
//! Provides:
//! - The trace sink boundary consumed by predictors
//! - Parsing of raw engine profile buffers into timing trees
//! - A lightweight metrics collector for serving counters

pub mod metrics;
pub mod profile;
pub mod trace;

pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use profile::{ProfileEntry, ProfileParseError, ProfileRecord};
pub use trace::{LogSink, RecordingSink, TraceEvent, TraceLevel, TracePhase, TraceSink};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::profile::ProfileRecord;
    pub use crate::trace::{LogSink, TraceEvent, TraceLevel, TraceSink};
}
