//! Run orchestration: clear → copy → index.
//!
//! ```text
//! 1. Clear   dist/          deleted and recreated empty
//! 2. Copy    source/  →  dist/     (skipped with --no-copy)
//! 3. Index   dist/ or source/  →  dist/**/index.html
//! ```
//!
//! Each stage runs to completion before the next starts, and the first error
//! aborts the run. Nothing is rolled back.

use crate::config::{IndexSource, MirrorConfig};
use crate::index::{self, IndexError};
use crate::snapshot::{self, CopyStats, SnapshotError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub output_root: PathBuf,
    pub index_source: IndexSource,
    pub copied: CopyStats,
    /// Written index pages, relative to the output root.
    pub indexes: Vec<PathBuf>,
}

pub fn build(config: &MirrorConfig) -> Result<BuildReport, BuildError> {
    snapshot::clear_output(config)?;

    let copied = if config.copies_files() {
        snapshot::copy_tree(config)?
    } else {
        CopyStats::default()
    };

    let indexes = index::generate_indexes(config)?;

    Ok(BuildReport {
        output_root: config.output_root().to_path_buf(),
        index_source: config.index_source(),
        copied,
        indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorOptions;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    fn scenario() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.txt", "alpha");
        write_file(tmp.path(), "sub/b.txt", "beta");
        write_file(tmp.path(), ".secret", "hidden");
        tmp
    }

    #[test]
    fn scenario_produces_expected_tree_and_listings() {
        let tmp = scenario();
        let config = config_for(tmp.path());

        let report = build(&config).unwrap();

        let out = config.output_root();
        assert_eq!(
            tree_listing(out),
            vec!["a.txt", "index.html", "sub/", "sub/b.txt", "sub/index.html"]
        );
        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(out.join("sub/b.txt")).unwrap(), "beta");
        assert_eq!(link_texts(&read_index(out, "")), vec!["a.txt", "sub/"]);
        assert_eq!(link_texts(&read_index(out, "sub")), vec!["..", "b.txt"]);

        assert_eq!(report.copied, CopyStats { files: 2, directories: 1 });
        assert_eq!(report.indexes.len(), 2);
        assert_eq!(report.index_source, IndexSource::Output);
    }

    #[test]
    fn parent_link_appears_once_everywhere_but_root() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "x/y/z/file.txt", "f");
        write_file(tmp.path(), "x/other.txt", "o");
        let config = config_for(tmp.path());

        let report = build(&config).unwrap();

        for relative in &report.indexes {
            let html = fs::read_to_string(config.output_root().join(relative)).unwrap();
            let parents = link_texts(&html).iter().filter(|t| *t == "..").count();
            let is_root = relative.parent() == Some(std::path::Path::new(""));
            assert_eq!(parents, usize::from(!is_root), "parent links in {relative:?}");
        }
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let tmp = scenario();
        write_file(tmp.path(), "sub/deeper/c.txt", "gamma");
        let config = config_for(tmp.path());

        build(&config).unwrap();
        let first: Vec<(String, Vec<u8>)> = snapshot_contents(config.output_root());
        build(&config).unwrap();
        let second = snapshot_contents(config.output_root());

        assert_eq!(first, second);
    }

    #[test]
    fn stale_output_is_removed() {
        let tmp = scenario();
        write_file(tmp.path(), "dist/stale.txt", "old");
        write_file(tmp.path(), "dist/gone/index.html", "old");
        let config = config_for(tmp.path());

        build(&config).unwrap();

        let listing = tree_listing(config.output_root());
        assert!(!listing.iter().any(|p| p.contains("stale") || p.contains("gone")));
    }

    #[test]
    fn source_index_without_copy_writes_only_pages() {
        let tmp = scenario();
        let options = MirrorOptions {
            source: tmp.path().to_path_buf(),
            index_from: IndexSource::Source,
            copy_files: false,
            ..MirrorOptions::default()
        };
        let config = MirrorConfig::resolve(options).unwrap();

        let report = build(&config).unwrap();

        assert_eq!(report.copied, CopyStats::default());
        assert_eq!(
            tree_listing(config.output_root()),
            vec!["index.html", "sub/", "sub/index.html"]
        );
        assert_eq!(
            link_texts(&read_index(config.output_root(), "")),
            vec!["a.txt", "sub/"]
        );
    }

    #[test]
    fn auxiliary_dir_is_neither_copied_nor_listed() {
        let tmp = scenario();
        write_file(tmp.path(), "compile/build.log", "log");
        let options = MirrorOptions {
            source: tmp.path().to_path_buf(),
            aux_dirs: vec!["compile".into()],
            ..MirrorOptions::default()
        };
        let config = MirrorConfig::resolve(options).unwrap();

        build(&config).unwrap();

        let out = config.output_root();
        assert!(!out.join("compile").exists());
        assert_eq!(link_texts(&read_index(out, "")), vec!["a.txt", "sub/"]);
    }

    #[cfg(unix)]
    #[test]
    fn failed_clear_stops_before_copy_and_index() {
        let tmp = scenario();
        let options = MirrorOptions {
            source: tmp.path().to_path_buf(),
            output: "blocked/dist".into(),
            ..MirrorOptions::default()
        };
        let config = MirrorConfig::resolve(options).unwrap();
        write_file(tmp.path(), "blocked", "not a directory");
        let before = tree_listing(tmp.path());

        let err = build(&config).unwrap_err();

        assert!(matches!(
            err,
            BuildError::Snapshot(SnapshotError::ClearOutput { .. })
        ));
        assert_eq!(tree_listing(tmp.path()), before);
    }

    #[test]
    fn blocked_index_write_aborts_the_run() {
        let tmp = scenario();
        // A directory named like the page that has to be written in `sub`.
        write_file(tmp.path(), "sub/index.html/inner.txt", "i");
        write_file(tmp.path(), "zzz/late.txt", "z");
        let config = config_for(tmp.path());

        let err = build(&config).unwrap_err();

        match err {
            BuildError::Index(IndexError::Write { path, .. }) => {
                assert_eq!(path, config.output_root().join("sub").join("index.html"));
            }
            other => panic!("expected index Write error, got {other:?}"),
        }
        let out = config.output_root();
        assert!(out.join("index.html").is_file());
        assert!(!out.join("zzz/index.html").exists());
    }

    fn snapshot_contents(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
        tree_listing(root)
            .into_iter()
            .filter(|p| !p.ends_with('/'))
            .map(|p| {
                let bytes = fs::read(root.join(&p)).unwrap();
                (p, bytes)
            })
            .collect()
    }
}
