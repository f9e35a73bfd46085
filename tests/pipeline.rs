//! End-to-end tests for the region pipeline
//!
//! Extracts come from a local HTTP responder and the graph builder is a
//! `sh -c` script, so these run without network access or Java.

#![cfg(unix)]

mod common;

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use common::{Route, TestServer};
use vns_fetcher::app::{
    BatchLauncher, ClientConfig, ImportCommand, PipelineStep, ProcessingUpdate, ProcessorConfig,
    Region, StepStatus,
};
use vns_fetcher::errors::{ImportError, ProcessError, StepError};

/// Writes every expected artifact into the output folder
const GOOD_IMPORT: &str = r#"test -s "$1" || exit 3
for f in edges geometry nodes properties; do echo graph > "$2/$f"; done
echo "Reading OSM file $1"
echo "Processed 12345 ways"
echo "Creating graph"
echo "Finished import""#;

/// Exits cleanly but only writes part of the graph
const PARTIAL_IMPORT: &str = r#"echo graph > "$2/edges"
echo "done""#;

/// Never finishes on its own
const SLOW_IMPORT: &str = r#"echo "Reading OSM file $1"
exec sleep 30"#;

fn script_command(script: &str) -> ImportCommand {
    ImportCommand::new(["sh", "-c", script, "sh", "{input}", "{output}"])
}

fn processor_config(temp: &TempDir, command: ImportCommand) -> ProcessorConfig {
    ProcessorConfig {
        output_dir: temp.path().join("out"),
        work_dir: temp.path().join("work"),
        import_command: command,
        ..Default::default()
    }
}

fn region(server: &TestServer, id: &str, name: &str) -> Region {
    Region::new(id, name).with_url("pbf", server.url(&format!("/{}-latest.osm.pbf", id)))
}

async fn extract_server() -> TestServer {
    TestServer::start(vec![
        ("/test/small-latest.osm.pbf", Route::ok(&b"PBF-DATA"[..])),
        ("/test/small.poly", Route::ok(&b"polygon"[..])),
        ("/test/other-latest.osm.pbf", Route::ok(&b"PBF-DATA"[..])),
    ])
    .await
}

/// Run a batch to the end, collecting every update that made it through
async fn run_batch(
    config: ProcessorConfig,
    regions: Vec<Region>,
) -> (vns_fetcher::app::BatchSummary, Vec<ProcessingUpdate>) {
    let client = ClientConfig::default().build_http_client().unwrap();
    let launcher = BatchLauncher::new(config, client, 1000);
    let mut bridge = launcher.launch(regions);

    let mut updates = Vec::new();
    while let Some(update) = bridge.next_update().await {
        updates.push(update);
    }
    let summary = tokio::time::timeout(Duration::from_secs(30), bridge.join())
        .await
        .unwrap()
        .unwrap();
    (summary, updates)
}

fn zip_entries(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_small_region_end_to_end() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let config = processor_config(&temp, script_command(GOOD_IMPORT));

    let (summary, updates) = run_batch(config, vec![region(&server, "test/small", "Small")]).await;

    assert!(summary.is_success(), "{:?}", summary);
    assert_eq!(server.hits("/test/small-latest.osm.pbf"), 1);
    assert_eq!(server.hits("/test/small.kml"), 1);

    let out = temp.path().join("out");
    assert_eq!(
        zip_entries(&out.join("small.zip")),
        vec![
            "small/edges",
            "small/geometry",
            "small/nodes",
            "small/properties",
            "small/small.poly",
            "small/small.timestamp",
            "small/timestamp",
        ]
    );
    assert!(out.join("small").join("edges").exists());
    assert!(!temp.path().join("work").join("vns-processing-test-small").exists());

    // Timestamps are the bare UTC instant, byte for byte
    let stamp = std::fs::read_to_string(out.join("small").join("timestamp")).unwrap();
    assert_eq!(stamp.len(), 20);
    assert!(!stamp.ends_with('\n'));
    assert!(chrono::NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%SZ").is_ok());
    assert_eq!(
        std::fs::read_to_string(out.join("small").join("small.timestamp")).unwrap(),
        stamp
    );

    // Every step reported completion, in order
    let completed: Vec<PipelineStep> = updates
        .iter()
        .filter_map(|u| u.step.as_ref())
        .filter(|s| s.status == StepStatus::Completed)
        .map(|s| s.step)
        .collect();
    assert_eq!(completed, PipelineStep::ALL.to_vec());

    let last = updates.last().unwrap();
    assert!(last.is_batch_event());
    assert_eq!(last.overall_progress, 100.0);
    assert!(last
        .status
        .starts_with("Batch processing complete! ✅ 1 succeeded, ❌ 0 failed"));
}

#[tokio::test]
async fn test_relative_output_dir_with_separate_import_dir() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let relative_out = tempfile::Builder::new()
        .prefix("vns-relative-out-")
        .tempdir_in(".")
        .unwrap();
    assert!(relative_out.path().is_relative());

    let builder_home = temp.path().join("graphhopper");
    std::fs::create_dir_all(&builder_home).unwrap();
    let config = ProcessorConfig {
        output_dir: relative_out.path().to_path_buf(),
        work_dir: temp.path().join("work"),
        import_command: script_command(GOOD_IMPORT),
        import_working_dir: Some(builder_home.clone()),
        ..Default::default()
    };

    let (summary, _) = run_batch(config, vec![region(&server, "test/small", "Small")]).await;

    assert!(summary.is_success(), "{:?}", summary);
    assert!(relative_out.path().join("small").join("edges").exists());
    assert!(relative_out.path().join("small.zip").exists());
    assert!(!builder_home.join(relative_out.path()).exists());
}

#[tokio::test]
async fn test_failed_region_does_not_stop_batch() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let config = processor_config(&temp, script_command(GOOD_IMPORT));

    let regions = vec![
        region(&server, "test/k", "Kaput"),
        region(&server, "test/other", "Other"),
    ];
    let (summary, updates) = run_batch(config, regions).await;

    assert!(!summary.is_success());
    assert!(!summary.cancelled);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].region.id, "test/k");
    assert_eq!(summary.failed[0].error.step(), PipelineStep::Download);
    assert_eq!(summary.succeeded.len(), 1);
    assert!(temp.path().join("out").join("other.zip").exists());
    assert!(!temp.path().join("out").join("k.zip").exists());

    // Failed region's work directory is left for inspection
    assert!(temp.path().join("work").join("vns-processing-test-k").exists());

    assert!(updates
        .iter()
        .any(|u| u.status == "Failed region 1/2: Kaput" && u.error.is_some()));
    assert!(summary
        .headline()
        .starts_with("Batch processing complete! ✅ 1 succeeded, ❌ 1 failed"));
}

#[tokio::test]
async fn test_missing_artifacts_fail_import() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let config = processor_config(&temp, script_command(PARTIAL_IMPORT));

    let (summary, _) = run_batch(config, vec![region(&server, "test/small", "Small")]).await;

    let failure = &summary.failed[0];
    match &failure.error {
        ProcessError::Step {
            step: PipelineStep::Import,
            source: StepError::Import(ImportError::MissingArtifacts { missing, .. }),
        } => assert_eq!(missing, &vec!["geometry", "nodes", "properties"]),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!temp.path().join("out").join("small.zip").exists());
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let config = processor_config(
        &temp,
        ImportCommand::new(["vns-fetcher-no-such-program", "{input}"]),
    );

    let (summary, _) = run_batch(config, vec![region(&server, "test/small", "Small")]).await;

    assert!(matches!(
        summary.failed[0].error,
        ProcessError::Step {
            step: PipelineStep::Import,
            source: StepError::Import(ImportError::Spawn { .. }),
        }
    ));
}

#[tokio::test]
async fn test_cancel_during_import_stops_batch() {
    let server = extract_server().await;
    let temp = TempDir::new().unwrap();
    let config = processor_config(&temp, script_command(SLOW_IMPORT));
    let client = ClientConfig::default().build_http_client().unwrap();
    let launcher = BatchLauncher::new(config, client, 1000);

    let mut bridge = launcher.launch(vec![
        region(&server, "test/small", "Small"),
        region(&server, "test/other", "Other"),
    ]);

    // Wait until the graph builder is running
    let waited = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(update) = bridge.next_update().await {
            if matches!(&update.step, Some(s) if s.step == PipelineStep::Import && s.status == StepStatus::Running)
            {
                return true;
            }
        }
        false
    })
    .await
    .unwrap();
    assert!(waited);

    bridge.cancel();
    let summary = tokio::time::timeout(Duration::from_secs(10), bridge.join())
        .await
        .expect("cancellation must end the batch promptly")
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].error.is_cancelled());
    assert_eq!(summary.failed[0].error.step(), PipelineStep::Import);
    assert_eq!(summary.not_started(), 1);
    assert!(summary.headline().ends_with("(cancelled)"));
    assert!(!temp.path().join("out").join("small.zip").exists());
    assert_eq!(server.hits("/test/other-latest.osm.pbf"), 0);
}
