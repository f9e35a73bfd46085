//! Region processor configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::processor;
use crate::errors::{ImportError, ImportResult};

/// Default graph builder invocation
const DEFAULT_IMPORT_COMMAND: &[&str] = &[
    "java",
    "-Xmx{memory_mb}m",
    "-Xms{memory_mb}m",
    "-Ddw.graphhopper.datareader.file={input}",
    "-Ddw.graphhopper.graph.location={output}",
    "-jar",
    "graphhopper-web-1.0-SNAPSHOT.jar",
    "import",
    "config-example.yml",
];

/// Graph builder command line with `{input}`, `{output}` and `{memory_mb}`
/// placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportCommand {
    pub argv: Vec<String>,
}

impl Default for ImportCommand {
    fn default() -> Self {
        Self::new(DEFAULT_IMPORT_COMMAND.iter().copied())
    }
}

impl ImportCommand {
    /// Build a template from its words
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitute placeholders and split into program and arguments
    pub fn render(
        &self,
        input: &Path,
        output: &Path,
        memory_mb: u32,
    ) -> ImportResult<(String, Vec<String>)> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let memory = memory_mb.to_string();

        let mut words = self.argv.iter().map(|word| {
            word.replace("{input}", &input)
                .replace("{output}", &output)
                .replace("{memory_mb}", &memory)
        });

        let program = words.next().ok_or(ImportError::EmptyCommand)?;
        if program.trim().is_empty() {
            return Err(ImportError::EmptyCommand);
        }
        Ok((program, words.collect()))
    }
}

/// Runtime configuration for [`RegionProcessor`](super::RegionProcessor)
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Where graph folders and archives are written
    pub output_dir: PathBuf,
    /// Parent of the per-region work directories
    pub work_dir: PathBuf,
    /// Heap size handed to the graph builder
    pub memory_mb: u32,
    pub import_command: ImportCommand,
    /// Working directory of the graph builder process
    pub import_working_dir: Option<PathBuf>,
    /// Files that must exist in the graph directory after import
    pub expected_artifacts: Vec<String>,
    /// Tool output lines kept for error reports
    pub tail_lines: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(processor::DEFAULT_OUTPUT_DIR),
            work_dir: std::env::temp_dir(),
            memory_mb: processor::DEFAULT_MEMORY_MB,
            import_command: ImportCommand::default(),
            import_working_dir: None,
            expected_artifacts: processor::EXPECTED_ARTIFACTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            tail_lines: processor::TAIL_LINES,
        }
    }
}
