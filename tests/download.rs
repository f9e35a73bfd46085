//! Streaming downloads against a local responder

mod common;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{Route, TestServer};
use vns_fetcher::app::{ClientConfig, Downloader};
use vns_fetcher::errors::DownloadError;

fn downloader() -> Downloader {
    Downloader::new(ClientConfig::default().build_http_client().unwrap())
}

fn part_files(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part"))
        .collect()
}

#[tokio::test]
async fn test_download_writes_file_and_reports_completion() {
    let server = TestServer::start(vec![("/a-latest.osm.pbf", Route::ok(&b"0123456789"[..]))]).await;
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("a.osm.pbf");

    let mut reports = Vec::new();
    let bytes = downloader()
        .download(
            &server.url("/a-latest.osm.pbf"),
            &destination,
            &CancellationToken::new(),
            |progress| reports.push(progress.downloaded),
        )
        .await
        .unwrap();

    assert_eq!(bytes, 10);
    assert_eq!(std::fs::read(&destination).unwrap(), b"0123456789");
    assert_eq!(reports.last(), Some(&10));
    assert!(part_files(temp.path()).is_empty());
}

#[tokio::test]
async fn test_not_found_creates_no_file() {
    let server = TestServer::start(vec![]).await;
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("gone.osm.pbf");

    let result = downloader()
        .download(
            &server.url("/gone.osm.pbf"),
            &destination,
            &CancellationToken::new(),
            |_| {},
        )
        .await;

    assert!(matches!(result, Err(DownloadError::Status { status: 404, .. })));
    assert!(!destination.exists());
    assert!(part_files(temp.path()).is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_rename_removes_partial_file() {
    let server = TestServer::start(vec![("/b.osm.pbf", Route::ok(&b"data"[..]))]).await;
    let temp = TempDir::new().unwrap();

    // A non-empty directory in the way makes the final rename fail
    let destination = temp.path().join("b.osm.pbf");
    std::fs::create_dir_all(destination.join("occupied")).unwrap();

    let result = downloader()
        .download(
            &server.url("/b.osm.pbf"),
            &destination,
            &CancellationToken::new(),
            |_| {},
        )
        .await;

    assert!(matches!(result, Err(DownloadError::Io(_))));
    assert!(part_files(temp.path()).is_empty());
    assert!(destination.join("occupied").exists());
}
