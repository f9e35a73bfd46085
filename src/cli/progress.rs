//! Progress display for unattended batches
//!
//! With a terminal on stderr the batch is shown as two indicatif bars, one
//! for the regions and one for the current step. Without a terminal, plain
//! lines are printed at step boundaries and at most every few seconds while a
//! step runs.

use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::processor::{BatchSummary, PipelineStep, ProcessingUpdate, StepStatus};

/// Configuration for the batch progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Use progress bars when stderr is a terminal
    pub enable_progress_bars: bool,
    /// Minimum gap between plain-text lines for a running step
    pub text_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            text_interval: Duration::from_secs(10),
        }
    }
}

struct Bars {
    multi: MultiProgress,
    batch: ProgressBar,
    step: ProgressBar,
}

/// Renders [`ProcessingUpdate`]s for the `--process` mode
pub struct ProgressDisplay {
    bars: Option<Bars>,
    text: TextReporter,
    total: usize,
}

impl ProgressDisplay {
    /// Create a display for a batch of `total` regions
    pub fn new(config: ProgressConfig, total: usize) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let bars = if config.enable_progress_bars && is_terminal {
            match build_bars(total) {
                Ok(bars) => Some(bars),
                Err(e) => {
                    debug!("Progress bar template error, using plain output: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if bars.is_none() {
            eprintln!("Processing {} region(s)...", total);
        }

        Self {
            bars,
            text: TextReporter::new(config.text_interval),
            total,
        }
    }

    /// Show one update
    pub fn update(&mut self, update: &ProcessingUpdate) {
        match &self.bars {
            Some(bars) => {
                if let Some(error) = &update.error {
                    bars.multi
                        .println(format!("❌ {}: {}", update.region, error))
                        .ok();
                }
                match &update.step {
                    None => {
                        let done = (update.overall_progress / 100.0 * self.total as f64).round();
                        bars.batch.set_position(done as u64);
                        bars.batch.set_message(update.status.clone());
                    }
                    Some(step) => {
                        bars.step.set_prefix(format!(
                            "{} {}/{}",
                            update.region,
                            step.step.index() + 1,
                            PipelineStep::COUNT
                        ));
                        bars.step.set_position(step.progress.round() as u64);
                        bars.step.set_message(step.description.clone());
                    }
                }
            }
            None => {
                if let Some(line) = self.text.line(update, Instant::now()) {
                    eprintln!("{}", line);
                }
            }
        }
    }

    /// Close the bars
    pub fn finish(&mut self, summary: &BatchSummary) {
        if let Some(bars) = self.bars.take() {
            bars.step.finish_and_clear();
            bars.batch.finish_with_message(summary.headline());
        }
    }
}

fn build_bars(total: usize) -> Result<Bars, indicatif::style::TemplateError> {
    let multi = MultiProgress::new();

    let batch = multi.add(ProgressBar::new(total as u64));
    batch.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    batch.enable_steady_tick(Duration::from_millis(120));

    let step = multi.add(ProgressBar::new(100));
    step.set_style(
        ProgressStyle::default_bar()
            .template("  {prefix:.bold} [{bar:30.green/white}] {pos:>3}% {wide_msg}")?
            .progress_chars("=> "),
    );

    Ok(Bars { multi, batch, step })
}

/// Decides which updates become plain-text lines
///
/// Batch events and step status changes always print. A running step prints
/// again only after `interval` has passed.
#[derive(Debug)]
pub struct TextReporter {
    interval: Duration,
    last: Option<(String, PipelineStep, StepStatus)>,
    last_line: Option<Instant>,
}

impl TextReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            last_line: None,
        }
    }

    /// Line to print for `update`, if any
    pub fn line(&mut self, update: &ProcessingUpdate, now: Instant) -> Option<String> {
        let error = update
            .error
            .as_ref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default();

        let Some(step) = &update.step else {
            return Some(format!(
                "[{:>3.0}%] {}{}",
                update.overall_progress, update.status, error
            ));
        };

        let key = (update.region.clone(), step.step, step.status);
        let changed = self.last.as_ref() != Some(&key);
        let due = self
            .last_line
            .map_or(true, |at| now.duration_since(at) >= self.interval);
        if !changed && !due {
            return None;
        }

        self.last = Some(key);
        self.last_line = Some(now);
        Some(format!(
            "  {} [{}/{} {}] {}{}",
            update.region,
            step.step.index() + 1,
            PipelineStep::COUNT,
            step.step,
            step.description,
            error
        ))
    }
}
