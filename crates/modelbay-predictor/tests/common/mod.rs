//! Shared mock engine and transport for predictor integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use modelbay_core::engine::{EngineHandle, InferenceEngine};
use modelbay_core::error::{Error, Result};
use modelbay_core::transport::ArtifactTransport;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Call counters shared between a mock engine and the test body
#[derive(Default)]
pub struct EngineCalls {
    pub open: AtomicUsize,
    pub predict: AtomicUsize,
    pub start_profiling: AtomicUsize,
    pub end_profiling: AtomicUsize,
    pub read_profile: AtomicUsize,
    pub disable_profiling: AtomicUsize,
    pub close: AtomicUsize,
}

/// Script controlling mock engine behavior
#[derive(Clone)]
pub struct EngineScript {
    /// Labels the fake model "knows"; output length is batch * labels
    pub label_count: usize,
    /// Fail `open` with an EngineOpen error
    pub fail_open: bool,
    /// Fail the next N predict calls
    pub fail_predicts: usize,
    /// Fail `start_profiling`
    pub fail_start_profiling: bool,
    /// Fail `read_profile`
    pub fail_read_profile: bool,
    /// Raw buffer returned by `read_profile`
    pub profile_buffer: String,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            label_count: 3,
            fail_open: false,
            fail_predicts: 0,
            fail_start_profiling: false,
            fail_read_profile: false,
            profile_buffer: r#"{"unit":"us","entries":[{"name":"Forward","start":0,"end":500}]}"#
                .to_string(),
        }
    }
}

/// Engine whose output for sample i, label j is `i * 100 + j`
pub struct MockEngine {
    pub calls: Arc<EngineCalls>,
    script: Mutex<EngineScript>,
}

impl MockEngine {
    pub fn new(script: EngineScript) -> Self {
        Self {
            calls: Arc::new(EngineCalls::default()),
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl InferenceEngine for MockEngine {
    async fn open(&self, graph_path: &Path, _output_layer: &str) -> Result<Box<dyn EngineHandle>> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap().clone();
        if script.fail_open {
            return Err(Error::engine_open(format!(
                "graph rejected: {}",
                graph_path.display()
            )));
        }
        Ok(Box::new(MockHandle {
            calls: Arc::clone(&self.calls),
            script,
        }))
    }
}

struct MockHandle {
    calls: Arc<EngineCalls>,
    script: EngineScript,
}

#[async_trait]
impl EngineHandle for MockHandle {
    async fn predict(&mut self, input: &[f32], _output_layer: &str, dims: &[u32]) -> Result<Vec<f32>> {
        self.calls.predict.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_predicts > 0 {
            self.script.fail_predicts -= 1;
            return Err(Error::prediction("engine evaluation failed"));
        }

        let sample_len: usize = dims.iter().product::<u32>() as usize;
        let batch = if sample_len == 0 { 1 } else { input.len() / sample_len };

        let mut output = Vec::with_capacity(batch * self.script.label_count);
        for i in 0..batch {
            for j in 0..self.script.label_count {
                output.push((i * 100 + j) as f32);
            }
        }
        Ok(output)
    }

    fn start_profiling(&mut self, _framework: &str, _phase: &str) -> Result<()> {
        self.calls.start_profiling.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_start_profiling {
            return Err(Error::prediction("profiler unavailable"));
        }
        Ok(())
    }

    fn end_profiling(&mut self) -> Result<()> {
        self.calls.end_profiling.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_profile(&mut self) -> Result<String> {
        self.calls.read_profile.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_read_profile {
            return Err(Error::prediction("profile buffer unavailable"));
        }
        Ok(self.script.profile_buffer.clone())
    }

    fn disable_profiling(&mut self) -> Result<()> {
        self.calls.disable_profiling.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory transport serving canned bytes per URL
pub struct MockTransport {
    files: HashMap<String, Vec<u8>>,
    /// Files written into the destination directory on archive extraction
    archive_contents: HashMap<String, Vec<u8>>,
    pub fetch_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            archive_contents: HashMap::new(),
            fetch_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
        }
    }

    pub fn serve(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), bytes.into());
        self
    }

    pub fn serve_in_archive(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.archive_contents.insert(name.into(), bytes.into());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactTransport for MockTransport {
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .files
            .get(url)
            .ok_or_else(|| Error::artifact_fetch(url, "connection refused"))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if !self.files.contains_key(url) {
            return Err(Error::artifact_fetch(url, "connection refused"));
        }
        tokio::fs::create_dir_all(dest_dir).await?;
        for (name, bytes) in &self.archive_contents {
            tokio::fs::write(dest_dir.join(name), bytes).await?;
        }
        Ok(())
    }
}

/// Graph bytes used by the standard scenario
pub const GRAPH_BYTES: &[u8] = b"serialized-graph";

/// Features file used by the standard scenario
pub const FEATURES_BYTES: &[u8] = b"cat\ndog\nbird\n";

pub const GRAPH_URL: &str = "http://models.test/resnet/g.bin";
pub const FEATURES_URL: &str = "http://models.test/resnet/f.txt";

/// Manifest for the standard scenario: one image input, three labels
pub fn scenario_manifest_yaml() -> String {
    use modelbay_predictor::artifacts::checksum_of;
    format!(
        r#"
name: resnet-tiny
version: "1.0"
framework: {{ name: CNTK, version: "2.3" }}
inputs:
  - type: image
    dimensions: [3, 2, 2]
    parameters:
      mean: [104.0, 117.0, 123.0]
      scale: 1.0
model:
  graph_url: {GRAPH_URL}
  features_url: {FEATURES_URL}
  graph_checksum: {graph_sum}
  features_checksum: {feat_sum}
attributes:
  batch_size: 2
"#,
        graph_sum = checksum_of(GRAPH_BYTES),
        feat_sum = checksum_of(FEATURES_BYTES),
    )
}

/// Transport preloaded with the standard scenario artifacts
pub fn scenario_transport() -> MockTransport {
    MockTransport::new()
        .serve(GRAPH_URL, GRAPH_BYTES)
        .serve(FEATURES_URL, FEATURES_BYTES)
}

/// One flattened 3x2x2 sample filled with a constant
pub fn sample(value: f32) -> Vec<f32> {
    vec![value; 12]
}
