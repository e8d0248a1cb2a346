//! Engine profile buffer parsing
//!
//! Engines report framework-level timings as a raw JSON buffer. This module
//! parses that buffer into a structured timing tree so it can be published
//! to a trace sink. Parsing is best-effort from the predictor's point of
//! view: a malformed buffer is the caller's to log, never to propagate into
//! a prediction result.

use serde::{Deserialize, Serialize};

/// Error parsing a raw profile buffer
#[derive(Debug, thiserror::Error)]
#[error("failed to parse profile buffer: {0}")]
pub struct ProfileParseError(#[from] serde_json::Error);

/// One timed operation inside an engine profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Operation name as reported by the engine
    pub name: String,

    /// Start timestamp, microseconds from profile start
    pub start: u64,

    /// End timestamp, microseconds from profile start
    pub end: u64,

    /// Nested operations
    #[serde(default)]
    pub children: Vec<ProfileEntry>,
}

impl ProfileEntry {
    /// Duration of this entry in microseconds
    pub fn duration_us(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Parsed timing tree from one profiled predict call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Time unit of the timestamps
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Top-level timed operations
    #[serde(default)]
    pub entries: Vec<ProfileEntry>,
}

fn default_unit() -> String {
    "us".to_string()
}

impl ProfileRecord {
    /// Parse a raw profile buffer as emitted by the engine
    pub fn parse(raw: &str) -> Result<Self, ProfileParseError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Wall time covered by the top-level entries, in microseconds
    pub fn total_duration_us(&self) -> u64 {
        let start = self.entries.iter().map(|e| e.start).min().unwrap_or(0);
        let end = self.entries.iter().map(|e| e.end).max().unwrap_or(0);
        end.saturating_sub(start)
    }
}
