//! Command handlers for VNS Fetcher CLI
//!
//! This module connects parsed arguments and the loaded configuration to the
//! application engine: the interactive selector, unattended batches and the
//! cache and config maintenance commands.

use std::path::PathBuf;
use std::time::Duration;

use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::app::{
    BatchLauncher, BatchSummary, CatalogClient, Geography, LocationResolver, Region, RegionTree,
};
use crate::app::signals::cancel_on_signal;
use crate::cli::progress::{ProgressConfig, ProgressDisplay};
use crate::cli::{CacheAction, CacheArgs, ConfigAction, ConfigArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, CatalogError, Result};
use crate::tui;

/// Start the interactive selector
///
/// Loads the catalog, applies the location hint and hands the terminal to
/// the UI until the user quits.
pub async fn handle_interactive(config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let regions = load_catalog(&client, config).await?;

    let resolver = LocationResolver::new(client.clone(), config.location.to_runtime_config());
    let location = resolver.detect().await;
    if location.found {
        info!("Detected location: {}", location.describe());
    }

    let geography = Geography::builtin();
    let mut tree = RegionTree::build(&regions, &geography);
    let focus = tree.apply_location_hint(&location, &regions, &geography);

    let ui_config = config.ui.to_runtime_config();
    let launcher = BatchLauncher::new(
        config.processor.to_runtime_config(),
        client,
        ui_config.channel_capacity,
    );

    let summary = tui::run(regions, tree, focus, launcher, ui_config).await?;
    if let Some(summary) = summary {
        print_summary(&summary);
    }
    Ok(())
}

/// Process the given region ids without the UI
///
/// Every id is resolved before anything starts. The batch stops early on
/// Ctrl+C or SIGTERM.
pub async fn handle_process(config: &AppConfig, ids: Vec<String>) -> Result<()> {
    if ids.is_empty() {
        return Err(AppError::generic("No region ids given to --process"));
    }

    let client = build_client(config)?;
    let regions = load_catalog(&client, config).await?;
    let batch = resolve_region_ids(&regions, &ids)?;
    let total = batch.len();

    println!("🚀 Processing {} region(s)...", total);
    for region in &batch {
        debug!("Queued {} ({})", region.name, region.id);
    }

    let launcher = BatchLauncher::new(
        config.processor.to_runtime_config(),
        client,
        config.ui.channel_capacity,
    );
    let mut bridge = launcher.launch(batch);
    let signal_task = cancel_on_signal(bridge.cancel_token());

    let mut display = ProgressDisplay::new(ProgressConfig::default(), total);
    while let Some(update) = bridge.next_update().await {
        display.update(&update);
    }

    let summary = bridge.join().await;
    signal_task.abort();
    let summary = summary?;

    display.finish(&summary);
    print_summary(&summary);

    if summary.is_success() {
        Ok(())
    } else {
        Err(AppError::BatchIncomplete {
            failed: total - summary.succeeded.len(),
            total,
        })
    }
}

/// Handle cache management commands
pub async fn handle_cache(args: CacheArgs, config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let catalog = CatalogClient::new(
        client,
        &config.catalog.to_runtime_config(),
        config.client.request_timeout,
    )?;
    let store = catalog.store();

    match args.action {
        CacheAction::Info => {
            println!("📦 Region Catalog Cache");
            println!("======================");
            println!("Location: {}", store.path().display());

            match store.info(catalog.freshness()).await {
                Some(info) => {
                    println!("Regions: {}", info.region_count);
                    println!("Last updated: {}", info.last_updated.to_rfc3339());
                    println!("Age: {}", HumanDuration(info.age));
                    if info.fresh {
                        println!("Status: ✅ fresh");
                    } else {
                        println!("Status: ⚠️  stale, refetched on next start");
                    }
                    println!(
                        "Freshness token: {}",
                        info.etag.as_deref().unwrap_or("none")
                    );
                }
                None => println!("ℹ️  No cached catalog"),
            }
        }
        CacheAction::Clear => {
            if store.clear().await? {
                println!("🗑️  Removed {}", store.dir().display());
            } else {
                println!("ℹ️  Nothing to clear at {}", store.dir().display());
            }
        }
    }
    Ok(())
}

/// Handle configuration file commands
pub async fn handle_config(
    args: ConfigArgs,
    config_path: Option<PathBuf>,
    config: &AppConfig,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = config_path
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("Could not determine a config directory"))?;
            AppConfig::write_default(&path, force).await?;
            println!("✅ Wrote default configuration to {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Match command-line ids against the catalog
///
/// An id matches a region exactly, or matches the last `/` segment of exactly
/// one region id. Every unmatched id is reported together.
pub fn resolve_region_ids(regions: &[Region], ids: &[String]) -> Result<Vec<Region>> {
    let mut resolved: Vec<Region> = Vec::new();
    let mut unknown = Vec::new();

    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        let found = regions.iter().find(|region| region.id == id).or_else(|| {
            let mut candidates = regions.iter().filter(|region| region.folder_name() == id);
            match (candidates.next(), candidates.next()) {
                (Some(region), None) => Some(region),
                _ => None,
            }
        });

        match found {
            Some(region) if resolved.iter().any(|r| r.id == region.id) => {
                debug!("Region {} listed twice", region.id)
            }
            Some(region) => resolved.push(region.clone()),
            None => unknown.push(id.to_string()),
        }
    }

    if !unknown.is_empty() {
        return Err(AppError::UnknownRegions { ids: unknown });
    }
    Ok(resolved)
}

fn build_client(config: &AppConfig) -> Result<Client> {
    let client = config
        .client
        .to_runtime_config()
        .build_http_client()
        .map_err(CatalogError::from)?;
    Ok(client)
}

async fn load_catalog(client: &Client, config: &AppConfig) -> Result<Vec<Region>> {
    let catalog = CatalogClient::new(
        client.clone(),
        &config.catalog.to_runtime_config(),
        config.client.request_timeout,
    )?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
    }
    spinner.set_message("🌍 Loading region catalog...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = catalog.fetch().await;
    spinner.finish_and_clear();

    let regions = result?;
    if regions.is_empty() {
        warn!("Catalog contained no regions");
    }
    info!("Loaded {} regions", regions.len());
    Ok(regions)
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("📊 {}", summary.headline());
    for failure in summary.failures() {
        println!("  ❌ {} ({}): {}", failure.region.name, failure.region.id, failure.error);
    }
    if summary.cancelled && summary.not_started() > 0 {
        println!("  ⏹️  {} region(s) not started", summary.not_started());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Region> {
        vec![
            Region::new("andorra", "Andorra"),
            Region::new("us/california", "California"),
            Region::new("us/georgia", "Georgia (US)"),
            Region::new("georgia", "Georgia"),
            Region::new("a/springfield", "Springfield A"),
            Region::new("b/springfield", "Springfield B"),
        ]
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_exact_and_leaf_segment_matches() {
        let resolved = resolve_region_ids(&catalog(), &ids(&["andorra", "california"])).unwrap();
        let resolved: Vec<&str> = resolved.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(resolved, vec!["andorra", "us/california"]);
    }

    #[test]
    fn test_exact_match_wins_over_segment() {
        let resolved = resolve_region_ids(&catalog(), &ids(&["georgia"])).unwrap();
        assert_eq!(resolved[0].id, "georgia");
    }

    #[test]
    fn test_ambiguous_and_unknown_ids_are_listed() {
        let err = resolve_region_ids(&catalog(), &ids(&["springfield", "atlantis", "andorra"]))
            .unwrap_err();
        match err {
            AppError::UnknownRegions { ids } => assert_eq!(ids, vec!["springfield", "atlantis"]),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicates_and_blanks_are_ignored() {
        let resolved =
            resolve_region_ids(&catalog(), &ids(&[" andorra ", "", "andorra"])).unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
