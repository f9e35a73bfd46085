//! Configuration management for VNS Fetcher
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! command line overrides. Every section is optional in the file; missing
//! keys keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CatalogConfig, ClientConfig, ImportCommand, LocationConfig, ProcessorConfig};
use crate::constants::{catalog, http, location, logging, processor, ui};
use crate::errors::{ConfigError, ConfigResult};
use crate::tui::UiConfig;

/// Config file names searched in the working directory, in order
const LOCAL_CONFIG_FILES: &[&str] = &["./vns-fetcher.toml", "./config.toml"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Region catalog source and cache
    pub catalog: CatalogConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Location hint lookup
    pub location: LocationConfigToml,
    /// Region pipeline
    pub processor: ProcessorConfigToml,
    /// Interactive UI
    pub ui: UiConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfigToml {
    /// Catalog index endpoint
    pub url: String,
    /// Cache directory (None = per-user cache directory)
    pub cache_dir: Option<PathBuf>,
    /// How long a cached catalog is reused
    #[serde(with = "humantime_serde")]
    pub freshness: Duration,
}

impl Default for CatalogConfigToml {
    fn default() -> Self {
        Self {
            url: catalog::INDEX_URL.to_string(),
            cache_dir: None,
            freshness: catalog::FRESHNESS_WINDOW,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,
    /// Timeout for catalog requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            pool_idle_timeout: http::POOL_IDLE_TIMEOUT,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// TOML-friendly location configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfigToml {
    /// Look up the operator's location at startup
    pub enabled: bool,
    /// Providers tried in order
    pub providers: Vec<String>,
    /// Bound on each provider
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for LocationConfigToml {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: location::PROVIDERS.iter().map(|p| p.to_string()).collect(),
            timeout: location::PROVIDER_TIMEOUT,
        }
    }
}

/// TOML-friendly processor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessorConfigToml {
    /// Output directory for graph folders and archives
    pub output_dir: PathBuf,
    /// Parent of per-region work directories (None = system temp dir)
    pub work_dir: Option<PathBuf>,
    /// Graph builder heap size in megabytes
    pub memory_mb: u32,
    /// Graph builder command template
    pub import_command: ImportCommand,
    /// Working directory for the graph builder (None = current directory)
    pub import_working_dir: Option<PathBuf>,
    /// Files required in the graph directory after import
    pub expected_artifacts: Vec<String>,
    /// Tool output lines kept for error reports
    pub tail_lines: usize,
}

impl Default for ProcessorConfigToml {
    fn default() -> Self {
        let runtime = ProcessorConfig::default();
        Self {
            output_dir: runtime.output_dir,
            work_dir: None,
            memory_mb: runtime.memory_mb,
            import_command: runtime.import_command,
            import_working_dir: None,
            expected_artifacts: runtime.expected_artifacts,
            tail_lines: runtime.tail_lines,
        }
    }
}

/// TOML-friendly UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfigToml {
    /// Render loop tick
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
    /// Progress channel capacity
    pub channel_capacity: usize,
}

impl Default for UiConfigToml {
    fn default() -> Self {
        Self {
            tick: ui::TICK_INTERVAL,
            channel_capacity: ui::CHANNEL_CAPACITY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Log file used while the interactive UI is running
    /// (None = `vns_fetcher.log` in the user state or local data directory)
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Where the interactive UI logs to
    ///
    /// Kept apart from the catalog cache so `cache clear` never removes it.
    pub fn resolve_log_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.log_file {
            return Some(path.clone());
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|dir| dir.join(catalog::CACHE_DIR_NAME).join(logging::LOG_FILE_NAME))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence defaults < file
    ///
    /// An explicitly named file must exist; otherwise the standard locations
    /// are searched and defaults are used if none exists.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, output_dir: Option<PathBuf>, cache_dir: Option<PathBuf>) {
        if let Some(dir) = output_dir {
            self.processor.output_dir = dir;
        }
        if let Some(dir) = cache_dir {
            self.catalog.cache_dir = Some(dir);
        }
    }

    /// Reject values that cannot work at runtime
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.processor.memory_mb == 0 {
            return Err(invalid("processor.memory_mb", "must be greater than 0"));
        }
        if self.processor.import_command.argv.is_empty() {
            return Err(invalid("processor.import_command", "must not be empty"));
        }
        if self.ui.channel_capacity == 0 {
            return Err(invalid("ui.channel_capacity", "must be greater than 0"));
        }
        if self.ui.tick.is_zero() {
            return Err(invalid("ui.tick", "must be greater than 0"));
        }
        if self.catalog.freshness.is_zero() {
            return Err(invalid("catalog.freshness", "must be greater than 0"));
        }
        if !["error", "warn", "info", "debug", "trace"]
            .contains(&self.logging.level.to_lowercase().as_str())
        {
            return Err(invalid(
                "logging.level",
                "expected one of error, warn, info, debug, trace",
            ));
        }
        Ok(())
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths: Vec<PathBuf> = LOCAL_CONFIG_FILES.iter().map(PathBuf::from).collect();
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(catalog::CACHE_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|source| ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write the commented default file to `path`
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: path.display().to_string(),
                reason: "file already exists (use --force to overwrite)".to_string(),
            });
        }

        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(io_error)?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let command = ImportCommand::default()
            .argv
            .iter()
            .map(|word| format!("    \"{}\",", word))
            .collect::<Vec<_>>()
            .join("\n");
        let artifacts = processor::EXPECTED_ARTIFACTS
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let providers = location::PROVIDERS
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# VNS Fetcher Configuration
# Every setting is optional; removed keys fall back to these defaults.

[catalog]
url = "{url}"
# Cache directory (leave unset to use the per-user cache directory)
# cache_dir = "/path/to/cache"
# How long a downloaded catalog is reused
freshness = "24h"

[client]
tcp_nodelay = true
pool_idle_timeout = "90s"
request_timeout = "60s"
connect_timeout = "30s"
user_agent = "{user_agent}"

[location]
# Pre-open the tree at your detected location
enabled = true
providers = [{providers}]
timeout = "3s"

[processor]
output_dir = "{output_dir}"
# Parent of the per-region work directories (leave unset for the system temp dir)
# work_dir = "/var/tmp"
memory_mb = {memory_mb}
# Placeholders: {{input}}, {{output}}, {{memory_mb}}
import_command = [
{command}
]
# Directory holding the GraphHopper jar and config
# import_working_dir = "/opt/graphhopper"
expected_artifacts = [{artifacts}]
tail_lines = {tail_lines}

[ui]
tick = "100ms"
channel_capacity = {channel_capacity}

[logging]
level = "info"  # error, warn, info, debug, trace
# log_file = "/path/to/vns_fetcher.log"  # Used while the interactive UI runs
"#,
            url = catalog::INDEX_URL,
            user_agent = http::USER_AGENT,
            providers = providers,
            output_dir = processor::DEFAULT_OUTPUT_DIR,
            memory_mb = processor::DEFAULT_MEMORY_MB,
            command = command,
            artifacts = artifacts,
            tail_lines = processor::TAIL_LINES,
            channel_capacity = ui::CHANNEL_CAPACITY,
        )
    }
}

impl CatalogConfigToml {
    /// Convert to runtime CatalogConfig
    pub fn to_runtime_config(&self) -> CatalogConfig {
        CatalogConfig {
            url: self.url.clone(),
            cache_dir: self.cache_dir.clone(),
            freshness: self.freshness,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: Some(self.pool_idle_timeout).filter(|d| !d.is_zero()),
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl LocationConfigToml {
    /// Convert to runtime LocationConfig
    pub fn to_runtime_config(&self) -> LocationConfig {
        LocationConfig {
            enabled: self.enabled,
            providers: self.providers.clone(),
            timeout: self.timeout,
        }
    }
}

impl ProcessorConfigToml {
    /// Convert to runtime ProcessorConfig
    pub fn to_runtime_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            output_dir: self.output_dir.clone(),
            work_dir: self.work_dir.clone().unwrap_or_else(std::env::temp_dir),
            memory_mb: self.memory_mb,
            import_command: self.import_command.clone(),
            import_working_dir: self.import_working_dir.clone(),
            expected_artifacts: self.expected_artifacts.clone(),
            tail_lines: self.tail_lines,
        }
    }
}

impl UiConfigToml {
    /// Convert to runtime UiConfig
    pub fn to_runtime_config(&self) -> UiConfig {
        UiConfig {
            tick: self.tick,
            channel_capacity: self.channel_capacity,
        }
    }
}
