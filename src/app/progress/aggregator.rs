//! Display state folded from progress updates

use std::collections::HashMap;

use crate::app::processor::{PipelineStep, ProcessingUpdate, StepProgress};

/// Latest known progress for rendering
///
/// The last update for a region+step pair wins. Overall batch progress only
/// moves forward, whatever order updates arrive in.
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    overall: f64,
    current_region: Option<String>,
    current_step: Option<StepProgress>,
    region_progress: f64,
    status: String,
    steps: HashMap<(String, PipelineStep), StepProgress>,
    errors: Vec<String>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one update into the display state
    pub fn apply(&mut self, update: ProcessingUpdate) {
        if let Some(error) = &update.error {
            let line = if update.region.is_empty() {
                error.clone()
            } else {
                format!("{}: {}", update.region, error)
            };
            // Step and batch events both report the same failure
            if !self.errors.contains(&line) {
                self.errors.push(line);
            }
        }

        match update.step {
            None => {
                self.overall = self.overall.max(update.overall_progress);
                self.status = update.status;
                if !update.region.is_empty() {
                    self.current_region = Some(update.region);
                }
            }
            Some(step) => {
                self.region_progress = update.overall_progress;
                self.current_region = Some(update.region.clone());
                self.steps
                    .insert((update.region, step.step), step.clone());
                self.current_step = Some(step);
            }
        }
    }

    /// Batch progress, 0 to 100
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Progress through the current region's steps, 0 to 100
    pub fn region_progress(&self) -> f64 {
        self.region_progress
    }

    pub fn current_region(&self) -> Option<&str> {
        self.current_region.as_deref()
    }

    pub fn current_step(&self) -> Option<&StepProgress> {
        self.current_step.as_ref()
    }

    /// Latest state of `step` for `region`
    pub fn step(&self, region: &str, step: PipelineStep) -> Option<&StepProgress> {
        self.steps.get(&(region.to_string(), step))
    }

    /// Latest batch status line
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Errors seen so far, oldest first
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Forget everything, ready for another batch
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
