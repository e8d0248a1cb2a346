//! Inference engine boundary
//!
//! The numerical engine is an opaque external component. This module pins
//! down the only contract the predictor relies on: open a graph, run
//! batched inference against a named output node, optionally capture a
//! profile, and release the handle.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Factory boundary for the external inference engine
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Load a serialized graph and prepare it for evaluation of the given
    /// output layer. Failure must not leak native resources.
    async fn open(&self, graph_path: &Path, output_layer: &str) -> Result<Box<dyn EngineHandle>>;
}

/// A loaded, ready-to-run model inside the external engine.
///
/// Handles are exclusively owned and single-threaded: the owner serializes
/// all calls. `close` must be called exactly once; the predictor lifecycle
/// tracks idempotence on top of this contract.
#[async_trait]
pub trait EngineHandle: Send {
    /// Evaluate the graph on a flattened input batch.
    ///
    /// `input` is the concatenation of per-sample tensors in batch order;
    /// `dims` are the per-sample dimensions. Returns one flat buffer with
    /// the batch outputs concatenated in the same order.
    async fn predict(&mut self, input: &[f32], output_layer: &str, dims: &[u32])
        -> Result<Vec<f32>>;

    /// Begin capturing a framework-level profile for subsequent calls
    fn start_profiling(&mut self, framework: &str, phase: &str) -> Result<()>;

    /// Stop the active profile capture
    fn end_profiling(&mut self) -> Result<()>;

    /// Read the raw profile buffer accumulated since `start_profiling`
    fn read_profile(&mut self) -> Result<String>;

    /// Return the engine to its unprofiled default state
    fn disable_profiling(&mut self) -> Result<()>;

    /// Release the native resources behind this handle
    fn close(&mut self) -> Result<()>;
}
