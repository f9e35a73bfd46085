//! Archive step: zip the graph folder under its folder name

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{ArchiveError, ArchiveResult};

/// Archive entry name for `path` below `root`, prefixed with `prefix/`
fn entry_name(root: &Path, path: &Path, prefix: &str) -> ArchiveResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::OutsideRoot {
            path: path.to_path_buf(),
        })?;

    let mut name = prefix.trim_end_matches('/').to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    Ok(name)
}

/// Whether a file of `size` bytes needs zip64 extensions
fn needs_zip64(size: u64) -> bool {
    size > u64::from(u32::MAX)
}

fn entry_options(size: u64) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(needs_zip64(size))
}

/// Write every regular file below `source_dir` into a zip at `destination`
///
/// Entries are named `<prefix>/<relative path>` and written in sorted order.
/// Directories get no entries of their own. The archive is assembled in a
/// temporary file next to `destination` and moved into place at the end.
/// Returns the number of files written.
pub fn write_archive(source_dir: &Path, prefix: &str, destination: &Path) -> ArchiveResult<usize> {
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut zip = ZipWriter::new(BufWriter::new(temp));

    let mut count = 0;
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry_name(source_dir, entry.path(), prefix)?;
        let size = entry.metadata()?.len();
        zip.start_file(name.as_str(), entry_options(size))?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        debug!("Archived {}", name);
        count += 1;
    }

    let temp = zip
        .finish()?
        .into_inner()
        .map_err(|e| ArchiveError::Io(e.into_error()))?;
    temp.persist(destination)
        .map_err(|e| ArchiveError::Io(e.error))?;

    Ok(count)
}

/// [`write_archive`] on the blocking pool
pub async fn create_archive(
    source_dir: PathBuf,
    prefix: String,
    destination: PathBuf,
) -> ArchiveResult<usize> {
    tokio::task::spawn_blocking(move || write_archive(&source_dir, &prefix, &destination))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}
