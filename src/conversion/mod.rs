//! Workbook to delimited-text conversion
//!
//! This module contains the streaming pipeline, the batch dispatcher,
//! configuration and statistics.

pub mod batch;
pub mod config;
pub mod engine;
pub mod stats;

pub use batch::{plan_jobs, resolve_worker_count, BatchDispatcher};
pub use config::{parse_delimiter, ConversionConfig, ConversionJob, SheetSelector};
pub use engine::{stream_rows, ConversionEngine, FLUSH_INTERVAL, UTF8_BOM};
pub use stats::{BatchReport, ConversionSummary, JobOutcome};

/// Result type for conversion operations
pub use crate::error::ConversionResult;
