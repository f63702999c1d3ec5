//! Per-job summaries and batch reporting

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Result of one successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub rows_written: u64,
    pub elapsed: Duration,
}

impl ConversionSummary {
    pub fn new(
        source: PathBuf,
        destination: Option<PathBuf>,
        rows_written: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            source,
            destination,
            rows_written,
            elapsed,
        }
    }

    /// Rows per second, zero for instantaneous conversions
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rows_written as f64 / secs
        } else {
            0.0
        }
    }
}

/// What happened to one batch job
#[derive(Debug)]
pub struct JobOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub worker_id: usize,
    pub result: Result<ConversionSummary, ConversionError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a whole batch, keyed by source path
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: BTreeMap<PathBuf, JobOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. Returns false if the source was already recorded.
    pub fn record(&mut self, outcome: JobOutcome) -> bool {
        if self.outcomes.contains_key(&outcome.source) {
            return false;
        }
        self.outcomes.insert(outcome.source.clone(), outcome);
        true
    }

    pub fn get(&self, source: &Path) -> Option<&JobOutcome> {
        self.outcomes.get(source)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Failed jobs, in source order
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.values().filter(|o| !o.is_success())
    }

    pub fn total_rows(&self) -> u64 {
        self.outcomes
            .values()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|summary| summary.rows_written)
            .sum()
    }

    /// Get a formatted summary
    pub fn summary(&self) -> String {
        format!(
            "Converted {} of {} files ({} rows) in {:.1}s, {} failed",
            self.success_count(),
            self.len(),
            self.total_rows(),
            self.elapsed.as_secs_f64(),
            self.failure_count()
        )
    }

    /// Serializable view of the report
    pub fn to_record(&self) -> BatchReportRecord {
        BatchReportRecord {
            generated_at: chrono::Utc::now(),
            elapsed_ms: self.elapsed.as_millis() as u64,
            succeeded: self.success_count(),
            failed: self.failure_count(),
            jobs: self
                .outcomes
                .values()
                .map(|outcome| JobRecord {
                    source: outcome.source.display().to_string(),
                    destination: outcome.destination.display().to_string(),
                    worker_id: outcome.worker_id,
                    rows_written: outcome.result.as_ref().ok().map(|s| s.rows_written),
                    elapsed_ms: outcome
                        .result
                        .as_ref()
                        .ok()
                        .map(|s| s.elapsed.as_millis() as u64),
                    error: outcome.result.as_ref().err().map(|e| e.user_message()),
                })
                .collect(),
        }
    }

    /// Export to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_record())
    }
}

/// JSON shape of a batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReportRecord {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub elapsed_ms: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<JobRecord>,
}

/// JSON shape of one job in a batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub source: String,
    pub destination: String,
    pub worker_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
