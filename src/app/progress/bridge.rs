//! Background batch execution and the handle the UI polls

use futures::FutureExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::ProgressSender;
use crate::app::models::Region;
use crate::app::processor::{BatchRunner, BatchSummary, ProcessingUpdate, ProcessorConfig, RegionProcessor};
use crate::errors::{AppError, Result};

/// Starts batches on the tokio runtime
#[derive(Debug, Clone)]
pub struct BatchLauncher {
    config: ProcessorConfig,
    client: Client,
    capacity: usize,
}

impl BatchLauncher {
    /// Create a launcher; `capacity` bounds the progress channel
    pub fn new(config: ProcessorConfig, client: Client, capacity: usize) -> Self {
        Self {
            config,
            client,
            capacity,
        }
    }

    /// Spawn a batch over `regions` with a fresh cancellation token
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(&self, regions: Vec<Region>) -> ProgressBridge {
        let (sender, rx) = ProgressSender::channel(self.capacity);
        let runner = BatchRunner::new(RegionProcessor::new(
            self.config.clone(),
            self.client.clone(),
            sender,
        ));
        let cancel = CancellationToken::new();
        let total = regions.len();

        let token = cancel.clone();
        let handle = tokio::spawn(async move { runner.run(regions, token).await });
        debug!(total, "Batch launched");

        ProgressBridge {
            rx,
            cancel,
            handle: Some(handle),
        }
    }
}

/// Consumer side of a running batch
///
/// Progress arrives over a lossy channel. The summary is taken from the task
/// itself once it has finished, so it is never lost to backpressure.
#[derive(Debug)]
pub struct ProgressBridge {
    rx: mpsc::Receiver<ProcessingUpdate>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<BatchSummary>>,
}

impl ProgressBridge {
    /// Drain every pending update without waiting
    pub fn poll_updates(&mut self) -> Vec<ProcessingUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Wait for the next update; `None` once the batch has ended
    pub async fn next_update(&mut self) -> Option<ProcessingUpdate> {
        self.rx.recv().await
    }

    /// Ask the batch to stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the running batch
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Summary, once the background task has finished
    ///
    /// Returns `None` while the batch is still running and after the summary
    /// has been taken.
    pub fn finished(&mut self) -> Option<Result<BatchSummary>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        handle.now_or_never().map(join_result)
    }

    /// Wait for the batch to end
    pub async fn join(mut self) -> Result<BatchSummary> {
        match self.handle.take() {
            Some(handle) => join_result(handle.await),
            None => Err(AppError::generic("batch summary already taken")),
        }
    }
}

fn join_result(
    result: std::result::Result<BatchSummary, tokio::task::JoinError>,
) -> Result<BatchSummary> {
    result.map_err(|e| {
        error!("Batch task failed: {}", e);
        AppError::generic(format!("batch task failed: {}", e))
    })
}
