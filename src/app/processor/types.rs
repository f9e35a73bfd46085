//! Pipeline step and progress event types
//!
//! Updates are observations only: the processor never reads them back, and a
//! consumer may drop any of them without affecting the pipeline.

use std::fmt;

use serde::Serialize;

/// One stage of the per-region pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStep {
    Download,
    Import,
    Organize,
    Archive,
    Cleanup,
}

impl PipelineStep {
    /// Every step in execution order
    pub const ALL: [PipelineStep; 5] = [
        PipelineStep::Download,
        PipelineStep::Import,
        PipelineStep::Organize,
        PipelineStep::Archive,
        PipelineStep::Cleanup,
    ];

    /// Number of steps per region
    pub const COUNT: usize = Self::ALL.len();

    /// Zero-based position in the sequence
    pub fn index(self) -> usize {
        match self {
            PipelineStep::Download => 0,
            PipelineStep::Import => 1,
            PipelineStep::Organize => 2,
            PipelineStep::Archive => 3,
            PipelineStep::Cleanup => 4,
        }
    }

    /// Short machine-friendly name
    pub fn name(self) -> &'static str {
        match self {
            PipelineStep::Download => "download",
            PipelineStep::Import => "import",
            PipelineStep::Organize => "organize",
            PipelineStep::Archive => "archive",
            PipelineStep::Cleanup => "cleanup",
        }
    }

    /// Operator-facing description
    pub fn description(self) -> &'static str {
        match self {
            PipelineStep::Download => "Downloading OSM data files",
            PipelineStep::Import => "Running GraphHopper import",
            PipelineStep::Organize => "Organizing files for VNS",
            PipelineStep::Archive => "Creating ZIP archive",
            PipelineStep::Cleanup => "Cleaning up temporary files",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status tag of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl StepStatus {
    /// Whether the step will not report again
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Running)
    }
}

/// Progress of the step currently running for a region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub step: PipelineStep,
    /// Detail line, e.g. transfer rate or importer stage
    pub description: String,
    /// 0 to 100
    pub progress: f64,
    pub status: StepStatus,
}

/// Event emitted by the processor and the batch runner
///
/// Region-level events carry a `step`; batch-level events (region started,
/// region finished, batch summary) carry none and their `overall_progress`
/// is the share of completed regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingUpdate {
    /// Display name of the region
    pub region: String,
    /// One-based index of the current step, 0 for batch-level events
    pub current_step: usize,
    pub total_steps: usize,
    pub step: Option<StepProgress>,
    /// 0 to 100
    pub overall_progress: f64,
    /// Free-text status line
    pub status: String,
    /// Terminal error, if the region or step failed
    pub error: Option<String>,
}

impl ProcessingUpdate {
    /// Region-level event for `step`
    ///
    /// Overall region progress counts finished steps only, so a running step
    /// contributes nothing until it completes.
    pub fn for_step(
        region: impl Into<String>,
        step: PipelineStep,
        progress: f64,
        description: impl Into<String>,
        status: StepStatus,
    ) -> Self {
        let finished = step.index() + usize::from(status == StepStatus::Completed);
        Self {
            region: region.into(),
            current_step: step.index() + 1,
            total_steps: PipelineStep::COUNT,
            step: Some(StepProgress {
                step,
                description: description.into(),
                progress: progress.clamp(0.0, 100.0),
                status,
            }),
            overall_progress: finished as f64 / PipelineStep::COUNT as f64 * 100.0,
            status: step.description().to_string(),
            error: None,
        }
    }

    /// Batch-level event with `completed` of `total` regions done
    pub fn for_batch(
        region: impl Into<String>,
        completed: usize,
        total: usize,
        status: impl Into<String>,
    ) -> Self {
        let overall_progress = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Self {
            region: region.into(),
            current_step: 0,
            total_steps: PipelineStep::COUNT,
            step: None,
            overall_progress,
            status: status.into(),
            error: None,
        }
    }

    /// Attach a terminal error
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Whether this is a batch-level event
    pub fn is_batch_event(&self) -> bool {
        self.step.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_and_names() {
        let names: Vec<&str> = PipelineStep::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["download", "import", "organize", "archive", "cleanup"]
        );
        for (position, step) in PipelineStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), position);
        }
        assert_eq!(PipelineStep::Import.to_string(), "import");
    }

    #[test]
    fn test_region_overall_progress_counts_finished_steps() {
        let running = ProcessingUpdate::for_step(
            "Small",
            PipelineStep::Organize,
            50.0,
            "moving",
            StepStatus::Running,
        );
        assert_eq!(running.current_step, 3);
        assert_eq!(running.overall_progress, 40.0);

        let done = ProcessingUpdate::for_step(
            "Small",
            PipelineStep::Cleanup,
            100.0,
            "done",
            StepStatus::Completed,
        );
        assert_eq!(done.overall_progress, 100.0);
        assert!(!done.is_batch_event());
    }

    #[test]
    fn test_step_progress_is_clamped() {
        let update = ProcessingUpdate::for_step(
            "Small",
            PipelineStep::Download,
            140.0,
            "",
            StepStatus::Running,
        );
        assert_eq!(update.step.unwrap().progress, 100.0);
    }

    #[test]
    fn test_batch_progress() {
        let update = ProcessingUpdate::for_batch("Small", 1, 4, "Completed region 1/4: Small");
        assert!(update.is_batch_event());
        assert_eq!(update.overall_progress, 25.0);
        assert_eq!(ProcessingUpdate::for_batch("", 0, 0, "").overall_progress, 100.0);
    }
}
