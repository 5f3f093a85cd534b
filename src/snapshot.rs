//! Snapshot builder: verbatim copy of the source tree into the output root.
//!
//! The output root is never updated in place. [`clear_output`] deletes
//! whatever is there and recreates an empty directory, then [`copy_tree`]
//! walks the source root and copies every entry that survives the
//! [`Exclusion`](crate::exclude::Exclusion) check.
//!
//! ## Copy Semantics
//!
//! - Files are copied byte-for-byte. Permission bits come along with
//!   [`std::fs::copy`]; access and modification times are restored afterwards
//!   with `filetime`.
//! - Directories are created as they are reached, so empty directories are
//!   mirrored too.
//! - Symbolic links are followed: a link to a file is copied as its target's
//!   content, a link to a directory is mirrored as a real directory. A link
//!   cycle is reported by the walker and aborts the run.
//!
//! The walk is iterative (`walkdir`), so nesting depth does not grow the call
//! stack. Any I/O error aborts the run and leaves partial output in place.

use crate::config::MirrorConfig;
use filetime::FileTime;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Cannot remove stale output root {}: {source}", .path.display())]
    ClearOutput { path: PathBuf, source: io::Error },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Walked outside the source root: {}", .0.display())]
    OutsideRoot(PathBuf),
}

/// What [`copy_tree`] produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
}

/// Delete the output root, if present, and recreate it empty.
///
/// A failed delete is fatal: continuing would publish a possibly stale tree.
pub fn clear_output(config: &MirrorConfig) -> Result<(), SnapshotError> {
    let output_root = config.output_root();
    let clear_err = |source| SnapshotError::ClearOutput {
        path: output_root.to_path_buf(),
        source,
    };

    match fs::symlink_metadata(output_root) {
        Ok(metadata) => {
            info!("Removing {}", output_root.display());
            if metadata.is_dir() {
                fs::remove_dir_all(output_root).map_err(clear_err)?;
            } else {
                fs::remove_file(output_root).map_err(clear_err)?;
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(clear_err(err)),
    }

    fs::create_dir_all(output_root).map_err(|source| SnapshotError::Write {
        path: output_root.to_path_buf(),
        source,
    })
}

/// Copy every non-excluded entry of the source root into the output root.
pub fn copy_tree(config: &MirrorConfig) -> Result<CopyStats, SnapshotError> {
    let source_root = config.source_root();
    let output_root = config.output_root();
    let exclusion = config.exclusion();
    let mut stats = CopyStats::default();

    info!(
        "Copying {} → {}",
        source_root.display(),
        output_root.display()
    );

    let walker = WalkDir::new(source_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match exclusion.reason(entry.file_name(), entry.path()) {
                Some(reason) => {
                    debug!("Skipping {} ({reason})", entry.path().display());
                    false
                }
                None => true,
            }
        });

    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_root)
            .map_err(|_| SnapshotError::OutsideRoot(entry.path().to_path_buf()))?;
        let target = output_root.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| SnapshotError::Write {
                path: target.clone(),
                source,
            })?;
            stats.directories += 1;
        } else {
            copy_file(entry.path(), &target)?;
            debug!("Copied {}", relative.display());
            stats.files += 1;
        }
    }

    Ok(stats)
}

/// Copy one file with its permissions and timestamps.
fn copy_file(src: &Path, dst: &Path) -> Result<(), SnapshotError> {
    let write_err = |source| SnapshotError::Write {
        path: dst.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(src).map_err(|source| SnapshotError::Read {
        path: src.to_path_buf(),
        source,
    })?;

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::copy(src, dst).map_err(write_err)?;

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dst, accessed, modified).map_err(write_err)?;

    Ok(())
}
