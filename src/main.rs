//! VNS Fetcher CLI application
//!
//! Interactive region selector and unattended batch runner that turns
//! Geofabrik extracts into zipped routing graphs.

use std::fs::OpenOptions;
use std::process;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vns_fetcher::cli::{
    handle_cache, handle_config, handle_interactive, handle_process, Cli, Commands, ConfigAction,
    ConfigArgs,
};
use vns_fetcher::config::AppConfig;
use vns_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // `config init` must work even when the named file does not exist yet
    let mut config = match &cli.command {
        Some(Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        })) => AppConfig::default(),
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };
    config.apply_overrides(cli.global.output_dir.clone(), cli.global.cache_dir.clone());

    init_logging(&cli, &config);
    info!("VNS Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let process_ids = cli.process_ids();
    match cli.command {
        Some(Commands::Cache(args)) => {
            info!("Executing cache command");
            handle_cache(args, &config).await
        }
        Some(Commands::Config(args)) => {
            info!("Executing config command");
            handle_config(args, cli.global.config, &config).await
        }
        None => match process_ids {
            Some(ids) => {
                info!("Processing {} region id(s)", ids.len());
                handle_process(&config, ids).await
            }
            None => handle_interactive(&config).await,
        },
    }
}

/// Initialize logging based on CLI verbosity and configuration
///
/// The interactive UI owns the terminal, so its log output goes to a file.
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.to_lowercase());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vns_fetcher={}", level)));

    if !cli.is_interactive() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(cli.global.very_verbose)
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    let log_path = config.logging.resolve_log_file();
    let file = log_path.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => {
            // Nothing may write to the terminal while the UI is up
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
            warn!("No log file available");
        }
    }
}
