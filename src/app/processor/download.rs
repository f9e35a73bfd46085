//! Download step: primary extract plus optional boundary files

use indicatif::HumanBytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::{RegionPaths, RegionProcessor, StepReporter};
use crate::app::models::Region;
use crate::constants::processor;
use crate::errors::{DownloadError, DownloadResult};

/// A boundary file derived from the extract locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFile {
    pub url: String,
    pub file_name: String,
}

/// Boundary file locators next to `extract_url`
///
/// `https://host/europe/germany-latest.osm.pbf` yields `germany.poly` and
/// `germany.kml` in the same directory. Anything that does not look like an
/// extract locator yields nothing.
pub fn boundary_urls(extract_url: &str) -> Vec<BoundaryFile> {
    let Ok(url) = Url::parse(extract_url) else {
        return Vec::new();
    };
    let Some(file_name) = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
    else {
        return Vec::new();
    };
    let Some(stem) = file_name
        .strip_suffix(processor::EXTRACT_SUFFIX)
        .or_else(|| file_name.strip_suffix(".osm.pbf"))
        .filter(|stem| !stem.is_empty())
    else {
        return Vec::new();
    };

    processor::BOUNDARY_EXTENSIONS
        .iter()
        .filter_map(|extension| {
            let file_name = format!("{}.{}", stem, extension);
            url.join(&file_name).ok().map(|joined| BoundaryFile {
                url: joined.to_string(),
                file_name,
            })
        })
        .collect()
}

impl RegionProcessor {
    pub(super) async fn run_download(
        &self,
        region: &Region,
        paths: &RegionPaths,
        reporter: &StepReporter<'_>,
        cancel: &CancellationToken,
    ) -> DownloadResult<String> {
        let url = region
            .primary_extract_url()
            .ok_or_else(|| DownloadError::MissingExtract {
                region: region.id.clone(),
            })?;

        tokio::fs::create_dir_all(&paths.work_dir).await?;

        let bytes = self
            .downloader
            .download(url, &paths.extract, cancel, |progress| {
                reporter.running(progress.percent().unwrap_or(0.0), progress.describe());
            })
            .await?;
        info!(region = %region.id, bytes, "Extract downloaded");

        let mut boundaries = 0;
        for boundary in boundary_urls(url) {
            let destination = paths.work_dir.join(&boundary.file_name);
            match self
                .downloader
                .download(&boundary.url, &destination, cancel, |_| {})
                .await
            {
                Ok(size) => {
                    debug!(file = %boundary.file_name, bytes = size, "Boundary file downloaded");
                    boundaries += 1;
                }
                Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
                Err(e) => warn!("Skipping optional boundary file {}: {}", boundary.file_name, e),
            }
        }

        Ok(format!(
            "Downloaded {} extract and {} boundary file(s)",
            HumanBytes(bytes),
            boundaries
        ))
    }
}
