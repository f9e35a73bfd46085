//! Error types for VNS Fetcher
//!
//! Each pipeline stage owns its own error enum so a failure can be reported
//! against the step that produced it. Errors carry enough context (paths,
//! URLs, captured tool output) to be shown to the operator without a debugger.

use std::path::PathBuf;

use thiserror::Error;

use crate::app::processor::PipelineStep;

/// Region catalog fetching and cache errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request failed before a response arrived
    #[error("Catalog request failed")]
    Network(#[from] reqwest::Error),

    /// Catalog endpoint answered with a non-success status
    #[error("Catalog endpoint {url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    /// Catalog body was not the expected JSON document
    #[error("Catalog response could not be parsed")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing the cache snapshot failed
    #[error("Catalog cache I/O failed at {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable cache directory could be determined
    #[error("Could not determine a cache directory for the region catalog")]
    NoCacheDir,
}

/// Geolocation provider errors
///
/// These never leave the location resolver: every variant collapses into a
/// "not found" location.
#[derive(Error, Debug)]
pub enum LocationError {
    /// Provider request failed or timed out
    #[error("Provider request failed")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider responded with HTTP {status}")]
    Status { status: u16 },

    /// Provider returned no country
    #[error("Provider returned an empty country")]
    EmptyCountry,
}

/// Download errors for extracts and boundary files
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request or body stream failed
    #[error("HTTP transfer failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with anything other than 200
    #[error("Download of {url} failed: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The region has no primary extract locator
    #[error("Region {region} has no primary extract URL")]
    MissingExtract { region: String },

    /// Locator could not be parsed
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// I/O error while writing the downloaded file
    #[error("File I/O error while downloading")]
    Io(#[from] std::io::Error),

    /// Download was interrupted by cancellation
    #[error("Download cancelled")]
    Cancelled,
}

/// External graph builder errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// Graph builder could not be started
    #[error("Failed to start graph builder `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Import command template is empty
    #[error("Graph builder command is empty")]
    EmptyCommand,

    /// Graph builder exited with a failure code
    #[error("Graph builder exited with {code}\n{}", .tail.join("\n"))]
    ExitStatus { code: String, tail: Vec<String> },

    /// Graph builder reported success but left required files out
    #[error("Graph builder output is missing {}\n{}", .missing.join(", "), .tail.join("\n"))]
    MissingArtifacts {
        missing: Vec<String>,
        tail: Vec<String>,
    },

    /// Waiting on the subprocess failed
    #[error("I/O error while supervising graph builder")]
    Io(#[from] std::io::Error),

    /// Import was interrupted by cancellation
    #[error("Import cancelled")]
    Cancelled,
}

/// File organisation errors after a successful import
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// Moving a boundary file into the graph directory failed
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a timestamp file failed
    #[error("Failed to write timestamp file {path}: {source}")]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scanning the work directory failed
    #[error("File I/O error while organising output")]
    Io(#[from] std::io::Error),
}

/// Archive creation errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Zip writer failed
    #[error("Zip archive error")]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk failed
    #[error("Failed to walk graph directory")]
    Walk(#[from] walkdir::Error),

    /// A walked path was not under the archive root
    #[error("Path {path} is outside the archive root")]
    OutsideRoot { path: PathBuf },

    /// Generic I/O error
    #[error("File I/O error while archiving")]
    Io(#[from] std::io::Error),

    /// Blocking archive task panicked or was aborted
    #[error("Archive task failed: {0}")]
    Task(String),
}

/// Error raised by a single pipeline step
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl StepError {
    /// Whether the step stopped because cancellation reached it mid-flight
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            StepError::Download(DownloadError::Cancelled) | StepError::Import(ImportError::Cancelled)
        )
    }
}

/// Outcome of a region that did not complete
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Cancellation was observed before or during the given step
    #[error("Cancelled during {step}")]
    Cancelled { step: PipelineStep },

    /// The given step failed
    #[error("{step} failed: {source}")]
    Step {
        step: PipelineStep,
        #[source]
        source: StepError,
    },
}

impl ProcessError {
    /// Wrap a step failure, folding mid-step cancellation into `Cancelled`
    pub fn at(step: PipelineStep, source: impl Into<StepError>) -> Self {
        let source = source.into();
        if source.is_cancelled() {
            ProcessError::Cancelled { step }
        } else {
            ProcessError::Step { step, source }
        }
    }

    /// Whether this is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled { .. })
    }

    /// Step at which the region stopped
    pub fn step(&self) -> PipelineStep {
        match self {
            ProcessError::Cancelled { step } | ProcessError::Step { step, .. } => *step,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Reading or writing a config file failed
    #[error("Configuration file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Region processing error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Regions named on the command line are not in the catalog
    #[error("Unknown region(s): {}", .ids.join(", "))]
    UnknownRegions { ids: Vec<String> },

    /// Batch completed with failures or was cancelled
    #[error("{failed} of {total} region(s) did not complete")]
    BatchIncomplete { failed: usize, total: usize },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Catalog(_) => "catalog",
            AppError::Process(_) => "process",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::UnknownRegions { .. } => "selection",
            AppError::BatchIncomplete { .. } => "batch",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Import result type alias
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_includes_tail() {
        let err = ImportError::ExitStatus {
            code: "exit status: 1".to_string(),
            tail: vec!["line one".to_string(), "OutOfMemoryError".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("exit status: 1"));
        assert!(text.contains("OutOfMemoryError"));
    }

    #[test]
    fn test_mid_step_cancellation_folds_into_cancelled() {
        let err = ProcessError::at(PipelineStep::Import, ImportError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.step(), PipelineStep::Import);

        let err = ProcessError::at(
            PipelineStep::Download,
            DownloadError::Status {
                url: "http://example/a.pbf".to_string(),
                status: 404,
            },
        );
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_app_error_category() {
        let err = AppError::UnknownRegions {
            ids: vec!["atlantis".to_string()],
        };
        assert_eq!(err.category(), "selection");
        assert!(err.to_string().contains("atlantis"));
    }
}
