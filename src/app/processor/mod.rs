//! Per-region processing pipeline
//!
//! A region runs through download → import → organize → archive → cleanup,
//! strictly in that order. Cancellation is checked before every step and is
//! also observed inside the long-running download and import steps. The
//! first failing step abandons the region; nothing is rolled back and the
//! work directory is left in place for inspection.
//!
//! The processor talks to the outside world only through the
//! [`ProgressSender`] it was built with.

pub mod archive;
pub mod batch;
pub mod config;
pub mod download;
pub mod import;
pub mod organize;
pub mod types;

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::client::Downloader;
use crate::app::models::Region;
use crate::app::progress::ProgressSender;
use crate::errors::{ProcessError, StepError};

pub use batch::{BatchRunner, BatchSummary, RegionFailure};
pub use config::{ImportCommand, ProcessorConfig};
pub use import::{ImportProgress, ImportProgressParser};
pub use types::{PipelineStep, ProcessingUpdate, StepProgress, StepStatus};

/// Filesystem locations used while processing one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPaths {
    /// Output folder and archive stem, the last segment of the region id
    pub folder: String,
    /// Per-region scratch directory
    pub work_dir: PathBuf,
    /// Downloaded primary extract
    pub extract: PathBuf,
    /// Graph builder output, later the deliverable folder
    pub graph_dir: PathBuf,
    /// Compressed copy of `graph_dir`
    pub archive: PathBuf,
}

impl RegionPaths {
    /// Derive all locations for `region`
    ///
    /// Relative roots are resolved against the current directory, since the
    /// graph builder may run from a different working directory.
    pub fn new(region: &Region, output_dir: &Path, work_root: &Path) -> Self {
        let output_dir = absolute(output_dir);
        let folder = region.folder_name().to_string();
        let work_dir = absolute(work_root).join(region.work_dir_name());
        Self {
            extract: work_dir.join(format!("{}.osm.pbf", folder)),
            graph_dir: output_dir.join(&folder),
            archive: output_dir.join(format!("{}.zip", folder)),
            work_dir,
            folder,
        }
    }
}

/// `path` joined onto the current directory when relative
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            warn!("Cannot resolve {} against the current directory: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

/// What a successfully processed region left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutput {
    pub graph_dir: PathBuf,
    pub archive: PathBuf,
    /// Number of files written into the archive
    pub archived_files: usize,
}

/// Emits step events on behalf of one region
pub(crate) struct StepReporter<'a> {
    sender: &'a ProgressSender,
    region: &'a str,
    step: PipelineStep,
}

impl<'a> StepReporter<'a> {
    fn new(sender: &'a ProgressSender, region: &'a str, step: PipelineStep) -> Self {
        Self {
            sender,
            region,
            step,
        }
    }

    pub(crate) fn running(&self, progress: f64, description: impl Into<String>) {
        self.report(progress, description, StepStatus::Running, None);
    }

    fn report(
        &self,
        progress: f64,
        description: impl Into<String>,
        status: StepStatus,
        error: Option<String>,
    ) {
        let mut update =
            ProcessingUpdate::for_step(self.region, self.step, progress, description, status);
        update.error = error;
        self.sender.emit(update);
    }
}

/// Runs the step sequence for one region at a time
#[derive(Debug, Clone)]
pub struct RegionProcessor {
    config: ProcessorConfig,
    downloader: Downloader,
    sender: ProgressSender,
}

impl RegionProcessor {
    /// Create a processor sharing `client` for downloads
    pub fn new(config: ProcessorConfig, client: Client, sender: ProgressSender) -> Self {
        Self {
            config,
            downloader: Downloader::new(client),
            sender,
        }
    }

    /// Processor configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Progress sender shared with the batch runner
    pub fn sender(&self) -> &ProgressSender {
        &self.sender
    }

    /// Locations used for `region`
    pub fn paths(&self, region: &Region) -> RegionPaths {
        RegionPaths::new(region, &self.config.output_dir, &self.config.work_dir)
    }

    /// Run every step for `region`
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::Cancelled` if `cancel` fired before or during a
    /// step, or `ProcessError::Step` naming the first step that failed.
    pub async fn process(
        &self,
        region: &Region,
        cancel: &CancellationToken,
    ) -> Result<RegionOutput, ProcessError> {
        let paths = self.paths(region);
        let mut archived_files = 0;
        info!(
            region = %region.id,
            work_dir = %paths.work_dir.display(),
            graph_dir = %paths.graph_dir.display(),
            "Processing region"
        );

        for step in PipelineStep::ALL {
            let reporter = StepReporter::new(&self.sender, &region.name, step);

            if cancel.is_cancelled() {
                reporter.report(0.0, "Cancelled", StepStatus::Cancelled, None);
                info!(region = %region.id, step = %step, "Cancelled before step");
                return Err(ProcessError::Cancelled { step });
            }

            reporter.running(0.0, step.description());
            debug!(region = %region.id, step = %step, "Step started");

            let outcome: Result<String, StepError> = match step {
                PipelineStep::Download => self
                    .run_download(region, &paths, &reporter, cancel)
                    .await
                    .map_err(StepError::from),
                PipelineStep::Import => self
                    .run_import(&paths, &reporter, cancel)
                    .await
                    .map_err(StepError::from),
                PipelineStep::Organize => {
                    organize::organize(&paths.work_dir, &paths.graph_dir, &paths.folder)
                        .await
                        .map(|summary| summary.describe())
                        .map_err(StepError::from)
                }
                PipelineStep::Archive => archive::create_archive(
                    paths.graph_dir.clone(),
                    paths.folder.clone(),
                    paths.archive.clone(),
                )
                .await
                .map(|count| {
                    archived_files = count;
                    format!("Archived {} file(s) to {}", count, paths.archive.display())
                })
                .map_err(StepError::from),
                PipelineStep::Cleanup => Ok(cleanup(&paths.work_dir).await),
            };

            match outcome {
                Ok(description) => {
                    reporter.report(100.0, description, StepStatus::Completed, None);
                    debug!(region = %region.id, step = %step, "Step completed");
                }
                Err(source) => {
                    let error = ProcessError::at(step, source);
                    let status = if error.is_cancelled() {
                        StepStatus::Cancelled
                    } else {
                        StepStatus::Failed
                    };
                    reporter.report(0.0, step.description(), status, Some(error.to_string()));
                    warn!(region = %region.id, step = %step, "Region stopped: {}", error);
                    return Err(error);
                }
            }
        }

        info!(region = %region.id, archive = %paths.archive.display(), "Region complete");
        Ok(RegionOutput {
            graph_dir: paths.graph_dir,
            archive: paths.archive,
            archived_files,
        })
    }
}

/// Remove the work directory, best effort
async fn cleanup(work_dir: &Path) -> String {
    match tokio::fs::remove_dir_all(work_dir).await {
        Ok(()) => format!("Removed {}", work_dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "Nothing to clean up".to_string(),
        Err(e) => {
            warn!("Could not remove work directory {}: {}", work_dir.display(), e);
            format!("Left {} in place", work_dir.display())
        }
    }
}
