//! Streaming file downloads with throttled progress and cancellation
//!
//! Bodies are streamed chunk by chunk into a `.part` file next to the
//! destination and renamed into place only once the stream has ended, so a
//! cancelled or failed transfer never leaves a truncated file under the final
//! name.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::StreamExt;
use indicatif::{HumanBytes, HumanDuration};
use reqwest::{Client, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::constants::processor;
use crate::errors::{DownloadError, DownloadResult};

/// Snapshot of an in-flight transfer
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// File name being written
    pub file_name: String,
    /// Bytes received so far
    pub downloaded: u64,
    /// Total size announced by the server, if any
    pub total: Option<u64>,
    /// Time since the response arrived
    pub elapsed: Duration,
}

impl DownloadProgress {
    /// Percent complete, when the total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.downloaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }

    /// Average transfer rate in bytes per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.downloaded as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time remaining at the average rate
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        let rate = self.rate();
        if rate <= 0.0 {
            return None;
        }
        let remaining = total.saturating_sub(self.downloaded) as f64;
        Some(Duration::from_secs_f64(remaining / rate))
    }

    /// One-line description for progress displays
    pub fn describe(&self) -> String {
        let rate = HumanBytes(self.rate() as u64);
        match (self.percent(), self.total) {
            (Some(percent), Some(total)) => {
                let eta = self
                    .eta()
                    .map(|eta| HumanDuration(eta).to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                format!(
                    "Downloading {} ({:.1}%) • {}/s • {} left • {}/{}",
                    self.file_name,
                    percent,
                    rate,
                    eta,
                    HumanBytes(self.downloaded),
                    HumanBytes(total)
                )
            }
            _ => format!(
                "Downloading {} • {}/s • {}",
                self.file_name,
                rate,
                HumanBytes(self.downloaded)
            ),
        }
    }
}

/// Decides when a transfer is worth reporting
///
/// Emits when the byte count crosses a multiple of `byte_step` or when
/// `interval` has passed since the previous emission, whichever is first.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    byte_step: u64,
    interval: Duration,
    last_bytes: u64,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    /// Create a throttle with explicit limits
    pub fn new(byte_step: u64, interval: Duration) -> Self {
        Self {
            byte_step: byte_step.max(1),
            interval,
            last_bytes: 0,
            last_emit: None,
        }
    }

    /// Returns true if progress at `downloaded` bytes should be reported now
    pub fn should_emit(&mut self, downloaded: u64, now: Instant) -> bool {
        let crossed = downloaded / self.byte_step > self.last_bytes / self.byte_step;
        let due = self
            .last_emit
            .map_or(true, |last| now.duration_since(last) >= self.interval);

        if crossed || due {
            self.last_bytes = downloaded;
            self.last_emit = Some(now);
            true
        } else {
            false
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(
            processor::DOWNLOAD_PROGRESS_BYTES,
            processor::PROGRESS_INTERVAL,
        )
    }
}

/// Streaming downloader over a shared HTTP client
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Creates a downloader using the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` into `destination`, reporting throttled progress
    ///
    /// Only a 200 response is accepted. The callback is invoked at most once
    /// per throttle window and always once after the last chunk.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the server answers with
    /// any other status, the transfer or file write fails, or `cancel` fires.
    pub async fn download<F>(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> DownloadResult<u64>
    where
        F: FnMut(&DownloadProgress),
    {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            response = self.client.get(parsed).send() => response.map_err(|source| DownloadError::Http {
                url: url.to_string(),
                source,
            })?,
        };

        if response.status() != StatusCode::OK {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let temp_path = partial_path(destination);
        let started = Instant::now();
        let mut progress = DownloadProgress {
            file_name,
            downloaded: 0,
            total: response.content_length(),
            elapsed: Duration::ZERO,
        };

        // Any failure past this point removes the partial file
        let outcome: DownloadResult<()> = async {
            let mut writer = BufWriter::new(File::create(&temp_path).await?);
            let mut stream = response.bytes_stream();
            let mut throttle = ProgressThrottle::default();

            loop {
                let chunk = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                    chunk = stream.next() => chunk,
                };

                let bytes = match chunk {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(source)) => {
                        return Err(DownloadError::Http {
                            url: url.to_string(),
                            source,
                        })
                    }
                    None => break,
                };

                writer.write_all(&bytes).await?;
                progress.downloaded += bytes.len() as u64;

                let now = Instant::now();
                if throttle.should_emit(progress.downloaded, now) {
                    progress.elapsed = now.duration_since(started);
                    on_progress(&progress);
                }
            }

            writer.flush().await?;
            drop(writer);
            tokio::fs::rename(&temp_path, destination).await?;
            Ok(())
        }
        .await;

        if let Err(e) = outcome {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        progress.elapsed = started.elapsed();
        on_progress(&progress);

        tracing::debug!(
            file = %progress.file_name,
            bytes = progress.downloaded,
            "Download finished"
        );
        Ok(progress.downloaded)
    }
}

/// Path of the in-flight file for `destination`
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(processor::PARTIAL_SUFFIX);
    PathBuf::from(name)
}
