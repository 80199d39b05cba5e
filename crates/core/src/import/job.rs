//! Single-flight, time-bounded import runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::{ImportError, ImportPipeline, ImportReport};
use crate::metrics::{IMPORT_DURATION, IMPORT_RUNS};

/// Guards an [`ImportPipeline`] so only one run is in flight and every run
/// finishes within a deadline.
///
/// A run that times out keeps the batches it already committed.
pub struct ImportJob {
    pipeline: Arc<ImportPipeline>,
    timeout: Duration,
    running: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a run ends, including when the run future
/// is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ImportJob {
    /// Create a job with the pipeline's configured timeout.
    pub fn new(pipeline: ImportPipeline) -> Self {
        let timeout = Duration::from_secs(pipeline.config().timeout_secs);
        Self::with_timeout(pipeline, timeout)
    }

    /// Create a job with an explicit timeout.
    pub fn with_timeout(pipeline: ImportPipeline, timeout: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            timeout,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run one import.
    ///
    /// Fails fast with [`ImportError::AlreadyRunning`] if another run is in
    /// flight, and with [`ImportError::TimedOut`] once the deadline passes.
    pub async fn run(&self) -> Result<ImportReport, ImportError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Import already running");
            IMPORT_RUNS
                .with_label_values(&[ImportError::AlreadyRunning.label()])
                .inc();
            return Err(ImportError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.pipeline.run()).await {
            Ok(result) => result,
            Err(_) => Err(ImportError::TimedOut {
                after_secs: self.timeout.as_secs(),
            }),
        };
        let elapsed = started.elapsed();

        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        IMPORT_RUNS.with_label_values(&[label]).inc();
        IMPORT_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(report) => info!(
                "Import finished in {:.1}s: {} rows written",
                elapsed.as_secs_f64(),
                report.rows_written
            ),
            Err(ImportError::TimedOut { .. }) => warn!(
                "Import timed out after {:.1}s; committed batches were kept, run again to finish",
                elapsed.as_secs_f64()
            ),
            Err(e) => error!("Import failed after {:.1}s: {}", elapsed.as_secs_f64(), e),
        }

        result
    }
}
