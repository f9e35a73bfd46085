//! Sequential batch processing over several regions
//!
//! Regions run one after another in the order given. A failed region is
//! recorded and the batch moves on; cancellation stops the batch before the
//! next region starts.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::RegionProcessor;
use crate::app::models::Region;
use crate::app::progress::ProgressSender;
use crate::app::processor::ProcessingUpdate;
use crate::errors::ProcessError;

/// A region that did not complete
#[derive(Debug)]
pub struct RegionFailure {
    pub region: Region,
    pub error: ProcessError,
}

/// End-of-batch outcome
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Regions requested
    pub total: usize,
    /// Regions that finished every step
    pub succeeded: Vec<Region>,
    /// Regions that failed, in processing order
    pub failed: Vec<RegionFailure>,
    /// Whether cancellation cut the batch short
    pub cancelled: bool,
}

impl BatchSummary {
    /// Regions never started because of cancellation
    pub fn not_started(&self) -> usize {
        self.total
            .saturating_sub(self.succeeded.len() + self.failed.len())
    }

    /// True if every requested region succeeded
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed.is_empty() && self.succeeded.len() == self.total
    }

    /// Regions that failed for a reason other than cancellation
    pub fn failures(&self) -> impl Iterator<Item = &RegionFailure> {
        self.failed.iter().filter(|f| !f.error.is_cancelled())
    }

    /// One-line summary for status bars and logs
    pub fn headline(&self) -> String {
        let mut line = format!(
            "Batch processing complete! ✅ {} succeeded, ❌ {} failed",
            self.succeeded.len(),
            self.failures().count()
        );
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())
    }
}

/// Runs regions through a [`RegionProcessor`] one at a time
#[derive(Debug, Clone)]
pub struct BatchRunner {
    processor: RegionProcessor,
}

impl BatchRunner {
    pub fn new(processor: RegionProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &RegionProcessor {
        &self.processor
    }

    fn sender(&self) -> &ProgressSender {
        self.processor.sender()
    }

    /// Process `regions` in order, collecting failures
    ///
    /// Never fails as a whole; per-region errors end up in the summary.
    pub async fn run(&self, regions: Vec<Region>, cancel: CancellationToken) -> BatchSummary {
        let total = regions.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        info!(total, "Starting batch");

        for (index, region) in regions.into_iter().enumerate() {
            let position = index + 1;
            let done = summary.succeeded.len() + summary.failed.len();

            if cancel.is_cancelled() {
                info!("Batch cancelled before region {}/{}", position, total);
                summary.cancelled = true;
                break;
            }

            self.sender().emit(ProcessingUpdate::for_batch(
                &region.name,
                done,
                total,
                format!("Starting region {}/{}: {}", position, total, region.name),
            ));

            match self.processor.process(&region, &cancel).await {
                Ok(output) => {
                    info!(
                        region = %region.id,
                        files = output.archived_files,
                        "Completed region {}/{}", position, total
                    );
                    self.sender().emit(ProcessingUpdate::for_batch(
                        &region.name,
                        done + 1,
                        total,
                        format!("Completed region {}/{}: {}", position, total, region.name),
                    ));
                    summary.succeeded.push(region);
                }
                Err(error) => {
                    let cancelled = error.is_cancelled();
                    if cancelled {
                        info!(region = %region.id, "Region cancelled: {}", error);
                    } else {
                        warn!(region = %region.id, "Region failed: {}", error);
                    }
                    self.sender().emit(
                        ProcessingUpdate::for_batch(
                            &region.name,
                            done + 1,
                            total,
                            format!("Failed region {}/{}: {}", position, total, region.name),
                        )
                        .with_error(error.to_string()),
                    );
                    summary.failed.push(RegionFailure { region, error });
                    if cancelled {
                        summary.cancelled = true;
                        break;
                    }
                }
            }
        }

        let headline = summary.headline();
        info!("{}", headline);
        self.sender()
            .emit(ProcessingUpdate::for_batch("", total, total, headline));
        summary
    }
}
