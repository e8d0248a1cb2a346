//! Framework profiling capture around a single predict call
//!
//! Profiling is diagnostic: every failure in this module is logged and
//! swallowed so it can never alter a prediction result or error. The engine
//! is always returned to its unprofiled default state once a capture ran.

use modelbay_core::engine::EngineHandle;
use modelbay_telemetry::{MetricsCollector, ProfileRecord, TraceLevel, TraceSink};
use tracing::warn;

/// Whether profiling should wrap a predict call
pub fn profiling_enabled(framework_profiling: bool, trace_level: TraceLevel) -> bool {
    framework_profiling && trace_level >= TraceLevel::Framework
}

/// One best-effort profiling capture bracketing a predict call
pub struct ProfilingCapture {
    active: bool,
}

impl ProfilingCapture {
    /// Start a capture on the engine if the gate allows it.
    ///
    /// A failed start downgrades to a warning and the predict call runs
    /// unprofiled.
    pub fn begin(
        handle: &mut dyn EngineHandle,
        framework: &str,
        framework_profiling: bool,
        trace_level: TraceLevel,
    ) -> Self {
        if !profiling_enabled(framework_profiling, trace_level) {
            return Self { active: false };
        }

        match handle.start_profiling(framework, "predict") {
            Ok(()) => Self { active: true },
            Err(e) => {
                warn!(framework, error = %e, "unable to start framework profiling");
                Self { active: false }
            }
        }
    }

    /// Stop the capture, publish the parsed profile, and reset the engine.
    ///
    /// Runs after the predict call returns, whatever its outcome.
    pub fn finish(
        self,
        handle: &mut dyn EngineHandle,
        sink: &dyn TraceSink,
        metrics: &MetricsCollector,
    ) {
        if !self.active {
            return;
        }

        if let Err(e) = handle.end_profiling() {
            warn!(error = %e, "unable to stop framework profiling");
        } else {
            match handle.read_profile() {
                Ok(raw) => match ProfileRecord::parse(&raw) {
                    Ok(record) => {
                        sink.publish_profile(&record);
                        metrics.record_profile_capture();
                    }
                    Err(e) => {
                        warn!(error = %e, buffer = %raw, "failed to parse profile buffer");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "failed to read profile buffer");
                }
            }
        }

        // Leave the engine unprofiled for the next call.
        if let Err(e) = handle.disable_profiling() {
            warn!(error = %e, "unable to disable framework profiling");
        }
    }
}
