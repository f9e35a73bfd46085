//! Organize step: boundary files and timestamps into the graph folder

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::constants::processor;
use crate::errors::OrganizeError;

/// What the organize step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizeSummary {
    /// Boundary files now in the graph folder
    pub moved: Vec<PathBuf>,
    /// Timestamp files written
    pub timestamps: Vec<PathBuf>,
}

impl OrganizeSummary {
    pub fn describe(&self) -> String {
        format!(
            "Moved {} boundary file(s), wrote {} timestamp file(s)",
            self.moved.len(),
            self.timestamps.len()
        )
    }
}

/// Timestamp file contents for `now`, without a trailing newline
pub fn timestamp_line(now: DateTime<Utc>) -> String {
    now.format(processor::TIMESTAMP_FORMAT).to_string()
}

fn is_boundary_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| {
            processor::BOUNDARY_EXTENSIONS.contains(&extension)
        })
}

/// Rename, or copy then delete when the rename crosses filesystems
async fn move_file(from: &Path, to: &Path) -> Result<(), OrganizeError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    let wrap = |source| OrganizeError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    tokio::fs::copy(from, to).await.map_err(wrap)?;
    tokio::fs::remove_file(from).await.map_err(wrap)?;
    Ok(())
}

/// Move boundary files from `work_dir` into `graph_dir` and stamp it
///
/// Writes `timestamp` and `<folder>.timestamp`, both holding the current UTC
/// time.
pub async fn organize(
    work_dir: &Path,
    graph_dir: &Path,
    folder: &str,
) -> Result<OrganizeSummary, OrganizeError> {
    tokio::fs::create_dir_all(graph_dir).await?;

    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_boundary_file(&path) {
            candidates.push(path);
        }
    }
    candidates.sort();

    let mut moved = Vec::with_capacity(candidates.len());
    for from in candidates {
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = graph_dir.join(name);
        move_file(&from, &to).await?;
        debug!("Moved {} to {}", from.display(), to.display());
        moved.push(to);
    }

    let stamp = timestamp_line(Utc::now());
    let mut timestamps = Vec::with_capacity(2);
    for name in [
        processor::TIMESTAMP_FILE.to_string(),
        format!("{}.{}", folder, processor::TIMESTAMP_FILE),
    ] {
        let path = graph_dir.join(name);
        tokio::fs::write(&path, &stamp)
            .await
            .map_err(|source| OrganizeError::Timestamp {
                path: path.clone(),
                source,
            })?;
        timestamps.push(path);
    }

    Ok(OrganizeSummary { moved, timestamps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(timestamp_line(now), "2024-03-09T07:05:01Z");
    }

    #[tokio::test]
    async fn test_organize_moves_boundaries_and_stamps() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let graph = temp.path().join("out").join("small");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(work.join("small.poly"), b"poly").unwrap();
        std::fs::write(work.join("small.kml"), b"kml").unwrap();
        std::fs::write(work.join("small.osm.pbf"), b"pbf").unwrap();

        let summary = organize(&work, &graph, "small").await.unwrap();

        assert_eq!(summary.moved.len(), 2);
        assert_eq!(std::fs::read(graph.join("small.poly")).unwrap(), b"poly");
        assert!(!work.join("small.poly").exists());
        assert!(work.join("small.osm.pbf").exists());
        assert!(!graph.join("small.osm.pbf").exists());

        for name in ["timestamp", "small.timestamp"] {
            let text = std::fs::read_to_string(graph.join(name)).unwrap();
            assert_eq!(text.len(), "2024-01-01T00:00:00Z".len());
            assert!(text.ends_with('Z'));
            assert!(DateTime::parse_from_rfc3339(&text).is_ok());
        }
    }

    #[tokio::test]
    async fn test_organize_without_boundaries() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir_all(&work).unwrap();

        let summary = organize(&work, &temp.path().join("graph"), "x")
            .await
            .unwrap();
        assert!(summary.moved.is_empty());
        assert_eq!(summary.timestamps.len(), 2);
    }
}
