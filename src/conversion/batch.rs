//! Concurrent batch conversion over a fixed pool of worker threads

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::sync::WaitGroup;
use indicatif::ProgressBar;

use crate::cli::path_mapping::{find_collisions, resolve_destination};
use crate::conversion::config::{ConversionConfig, ConversionJob};
use crate::conversion::engine::ConversionEngine;
use crate::conversion::stats::{BatchReport, JobOutcome};
use crate::discovery::FileSortInfo;
use crate::error::ConversionError;
use crate::scanner::WorkbookOpener;

/// Number of workers to start for a requested count; `0` means one more
/// than the number of available cores.
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|cores| cores.get())
        .unwrap_or(1)
        + 1
}

/// Build one job per discovered file, naming destinations with `mask`.
///
/// Each job gets its own copy of `config`. Destinations shared by several
/// sources are logged but kept: every such job truncates and rewrites the
/// same file. With one worker that means the last job's output remains;
/// with several, jobs may write concurrently and the file content is
/// undefined.
pub fn plan_jobs(files: &[FileSortInfo], mask: &str, config: &ConversionConfig) -> Vec<ConversionJob> {
    let jobs: Vec<ConversionJob> = files
        .iter()
        .map(|file| {
            ConversionJob::new(
                file.path.clone(),
                Some(resolve_destination(mask, &file.path)),
                config.clone(),
            )
        })
        .collect();

    let pairs = jobs.iter().filter_map(|job| {
        job.destination
            .as_deref()
            .map(|destination| (job.source.as_path(), destination))
    });
    for (destination, sources) in find_collisions(pairs) {
        tracing::warn!(
            destination = %destination.display(),
            sources = sources.len(),
            "several workbooks resolve to the same destination; their outputs overwrite each other"
        );
    }

    jobs
}

/// Runs conversion jobs on a fixed pool of worker threads
pub struct BatchDispatcher<O: WorkbookOpener> {
    engine: Arc<ConversionEngine<O>>,
    worker_count: usize,
    progress: Option<ProgressBar>,
}

impl<O: WorkbookOpener + 'static> BatchDispatcher<O> {
    /// Create a dispatcher. A worker count of zero is raised to one.
    pub fn new(engine: ConversionEngine<O>, worker_count: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            worker_count: worker_count.max(1),
            progress: None,
        }
    }

    /// Advance `progress` once per finished job
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn engine(&self) -> &ConversionEngine<O> {
        &self.engine
    }

    /// Convert every job exactly once and collect one outcome per job.
    ///
    /// A failing job never stops the batch. Returns after all workers have
    /// exited.
    pub fn run(&self, jobs: Vec<ConversionJob>) -> BatchReport {
        let started = Instant::now();
        let total = jobs.len();
        let mut report = BatchReport::new();
        if total == 0 {
            return report;
        }

        // Sized to the job count so submission never blocks
        let (job_tx, job_rx) = bounded::<ConversionJob>(total);
        let (outcome_tx, outcome_rx) = bounded::<JobOutcome>(total);
        let wait_group = WaitGroup::new();

        let mut spawned = 0;
        for worker_id in 0..self.worker_count {
            let jobs = job_rx.clone();
            let outcomes = outcome_tx.clone();
            let engine = Arc::clone(&self.engine);
            let done = wait_group.clone();

            let handle = thread::Builder::new()
                .name(format!("xlsx2csv-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, &engine, jobs, outcomes);
                    drop(done);
                });

            match handle {
                Ok(_) => spawned += 1,
                Err(e) => {
                    tracing::warn!(worker = worker_id, error = %e, "cannot start worker thread");
                    break;
                }
            }
        }

        for job in jobs {
            // Cannot fail: capacity equals the job count and a receiver is held
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        drop(outcome_tx);

        if spawned == 0 {
            tracing::warn!("no worker threads available, converting on the calling thread");
            let (inline_tx, inline_rx) = bounded::<JobOutcome>(total);
            run_worker(0, &self.engine, job_rx, inline_tx);
            self.collect(inline_rx, total, &mut report);
        } else {
            drop(job_rx);
            self.collect(outcome_rx, total, &mut report);
        }

        wait_group.wait();
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            jobs = total,
            workers = spawned.max(1),
            failed = report.failure_count(),
            "batch finished"
        );
        report
    }

    fn collect(&self, outcomes: Receiver<JobOutcome>, total: usize, report: &mut BatchReport) {
        for _ in 0..total {
            let outcome = match outcomes.recv() {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(
                        received = report.len(),
                        expected = total,
                        "all workers exited before reporting every job"
                    );
                    break;
                }
            };

            if let Err(e) = &outcome.result {
                let line = format!("✗ {}: {}", outcome.source.display(), e.user_message());
                match &self.progress {
                    Some(progress) => progress.suspend(|| eprintln!("{}", line)),
                    None => eprintln!("{}", line),
                }
            }
            if let Some(progress) = &self.progress {
                progress.inc(1);
            }

            if !report.record(outcome) {
                tracing::error!("duplicate outcome received for one source");
            }
        }
    }
}

fn run_worker<O: WorkbookOpener>(
    worker_id: usize,
    engine: &ConversionEngine<O>,
    jobs: Receiver<ConversionJob>,
    outcomes: Sender<JobOutcome>,
) {
    // Ends once the queue is closed and drained
    for job in jobs.iter() {
        let destination = job.destination.clone().unwrap_or_default();
        tracing::info!(worker = worker_id, source = %job.source.display(), "job started");

        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.convert(&job)))
            .unwrap_or_else(|_| {
                Err(ConversionError::other(anyhow::anyhow!(
                    "conversion of {} panicked",
                    job.source.display()
                )))
            });

        match &result {
            Ok(summary) => tracing::info!(
                worker = worker_id,
                destination = %destination.display(),
                rows = summary.rows_written,
                "job finished"
            ),
            Err(e) => tracing::warn!(
                worker = worker_id,
                source = %job.source.display(),
                destination = %destination.display(),
                error = %e,
                "job failed"
            ),
        }

        let outcome = JobOutcome {
            source: job.source,
            destination,
            worker_id,
            result,
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!(worker = worker_id, "worker stopped");
}
