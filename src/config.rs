//! Run configuration.
//!
//! Everything a run depends on is resolved once, up front, into an immutable
//! [`MirrorConfig`] that is passed explicitly to the snapshot builder and the
//! index generator. Nothing is read from process-wide state after that point,
//! which is what lets the tests point a full run at any temporary directory.
//!
//! ## Sources of Configuration
//!
//! 1. Built-in defaults ([`MirrorOptions::default`]): mirror `.` into `dist`.
//! 2. An optional TOML file, only when one is passed with `--config`.
//! 3. Command-line flags, which extend or override the file.
//!
//! ## Config File
//!
//! ```toml
//! # All keys are optional
//! exclude = ["Makefile"]   # Extra names excluded at every level
//! aux_dirs = ["compile"]   # Directories (relative to the source root) never copied or indexed
//! index_from = "output"    # Index the copied tree ("output") or the live source ("source")
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::exclude::Exclusion;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Cannot open source root {}: {source}", .path.display())]
    SourceRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot resolve output root {}: {source}", .path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Which tree the index generator walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    /// Index the freshly copied output tree, so listings match what was published.
    #[default]
    Output,
    /// Index the live source tree, writing the pages into the output root.
    Source,
}

impl IndexSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexSource::Output => "output",
            IndexSource::Source => "source",
        }
    }
}

/// Contents of an optional `--config` TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Extra entry names excluded at every level.
    pub exclude: Vec<String>,
    /// Auxiliary directories, relative to the source root.
    pub aux_dirs: Vec<PathBuf>,
    /// Which tree to index.
    pub index_from: Option<IndexSource>,
}

pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Unresolved options, as collected from defaults, a config file and the CLI.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub source: PathBuf,
    /// Output directory. Relative paths are taken relative to `source`.
    pub output: PathBuf,
    /// The tool's own file name, excluded wherever it appears.
    pub program_name: Option<OsString>,
    pub exclude: Vec<String>,
    pub aux_dirs: Vec<PathBuf>,
    pub index_from: IndexSource,
    pub copy_files: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            output: PathBuf::from("dist"),
            program_name: None,
            exclude: Vec::new(),
            aux_dirs: Vec::new(),
            index_from: IndexSource::Output,
            copy_files: true,
        }
    }
}

impl MirrorOptions {
    /// Layer a config file on top of these options.
    pub fn apply_file(&mut self, file: FileConfig) {
        self.exclude.extend(file.exclude);
        self.aux_dirs.extend(file.aux_dirs);
        if let Some(index_from) = file.index_from {
            self.index_from = index_from;
        }
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    source_root: PathBuf,
    output_root: PathBuf,
    exclusion: Exclusion,
    index_source: IndexSource,
    copy_files: bool,
}

impl MirrorConfig {
    /// Resolve and validate options.
    ///
    /// The source root is canonicalized. The output root is resolved against
    /// it through [`resolve_output`], so symlinks anywhere along the way are
    /// followed before checking that deleting it cannot take the source with
    /// it. Auxiliary directories are normalized lexically.
    pub fn resolve(options: MirrorOptions) -> Result<Self, ConfigError> {
        let source_root =
            fs::canonicalize(&options.source).map_err(|source| ConfigError::SourceRoot {
                path: options.source.clone(),
                source,
            })?;
        if !source_root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "source root {} is not a directory",
                source_root.display()
            )));
        }

        let output_path = source_root.join(&options.output);
        let output_root = resolve_output(&output_path)?;
        if source_root.starts_with(&output_root) {
            return Err(ConfigError::Validation(format!(
                "output root {} must not contain the source root (it is deleted on every run)",
                output_root.display()
            )));
        }
        if !options.copy_files && options.index_from == IndexSource::Output {
            return Err(ConfigError::Validation(
                "indexing the output tree requires copying files".into(),
            ));
        }

        let aux_dirs = options
            .aux_dirs
            .iter()
            .map(|dir| normalize(&source_root.join(dir)))
            .collect();
        let names = options
            .program_name
            .into_iter()
            .chain(options.exclude.into_iter().map(OsString::from));
        // The walk sees the output root under its spelled-out path when it is
        // reached through a symlink inside the source tree.
        let mut output_roots = vec![output_root.clone()];
        let spelled = normalize(&output_path);
        if spelled != output_root {
            output_roots.push(spelled);
        }
        let exclusion = Exclusion::new(names, output_roots, aux_dirs);

        Ok(Self {
            source_root,
            output_root,
            exclusion,
            index_source: options.index_from,
            copy_files: options.copy_files,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn exclusion(&self) -> &Exclusion {
        &self.exclusion
    }

    pub fn index_source(&self) -> IndexSource {
        self.index_source
    }

    pub fn copies_files(&self) -> bool {
        self.copy_files
    }

    /// The tree the index generator walks.
    pub fn index_root(&self) -> &Path {
        match self.index_source {
            IndexSource::Output => &self.output_root,
            IndexSource::Source => &self.source_root,
        }
    }
}

/// File name of the running executable, used as the default reserved name.
pub fn current_program_name() -> Option<OsString> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|name| name.to_os_string()))
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components that do not exist yet.
///
/// The output root usually does not exist on a first run, so a plain
/// `canonicalize` is not enough, but any symlink in the part that does exist
/// must be resolved before the path is trusted for a recursive delete.
fn resolve_output(path: &Path) -> Result<PathBuf, ConfigError> {
    // Normalized first: the path checked is exactly the path later deleted.
    let normalized = normalize(path);
    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(normalized.clone()),
                }
            }
            Err(source) => {
                return Err(ConfigError::OutputRoot {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
