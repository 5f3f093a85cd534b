//! The exclusion set shared by copying and indexing.
//!
//! Both the snapshot builder and the index generator ask the same question for
//! every directory entry they meet: should this entry be published? Keeping the
//! answer in one type guarantees that an index never links to something that
//! was not copied, and never omits something that was.
//!
//! An entry is excluded when any of these hold:
//!
//! - its name starts with [`HIDDEN_MARKER`] (`.git`, `.DS_Store`, `.env`, ...)
//! - its name is one of the configured names (the tool's own program name by default)
//! - its source-side path is the output root (resolved or as written)
//! - its source-side path is one of the configured auxiliary directories
//!
//! The decision is made per entry, at every level of the walk. Excluding
//! `build/` at the root says nothing about `docs/build/`; only name rules apply
//! at every depth, path rules match exactly one location.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Names starting with this character are never published.
pub const HIDDEN_MARKER: u8 = b'.';

/// Why an entry was left out. Used for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    Hidden,
    ReservedName,
    OutputRoot,
    Auxiliary,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExclusionReason::Hidden => "hidden",
            ExclusionReason::ReservedName => "reserved name",
            ExclusionReason::OutputRoot => "output root",
            ExclusionReason::Auxiliary => "auxiliary directory",
        };
        f.write_str(text)
    }
}

/// Predicate over `(name, source path)` pairs.
///
/// Paths are compared component-wise against the source-side location of an
/// entry, so callers walking the output tree must map the entry back to where
/// it would live under the source root before asking.
#[derive(Debug, Clone)]
pub struct Exclusion {
    names: BTreeSet<OsString>,
    output_roots: Vec<PathBuf>,
    aux_dirs: Vec<PathBuf>,
}

impl Exclusion {
    /// `output_roots` holds every spelling of the output root a walk of the
    /// source tree can meet: its resolved location and, when a symlink is
    /// involved, the path as written.
    pub fn new<I, N>(names: I, output_roots: Vec<PathBuf>, aux_dirs: Vec<PathBuf>) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<OsString>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            output_roots,
            aux_dirs,
        }
    }

    /// Return the first rule matching this entry, if any.
    pub fn reason(&self, name: &OsStr, source_path: &Path) -> Option<ExclusionReason> {
        if name.as_encoded_bytes().first() == Some(&HIDDEN_MARKER) {
            Some(ExclusionReason::Hidden)
        } else if self.names.contains(name) {
            Some(ExclusionReason::ReservedName)
        } else if self.output_roots.iter().any(|root| root.as_path() == source_path) {
            Some(ExclusionReason::OutputRoot)
        } else if self.aux_dirs.iter().any(|aux| aux.as_path() == source_path) {
            Some(ExclusionReason::Auxiliary)
        } else {
            None
        }
    }

    pub fn is_excluded(&self, name: &OsStr, source_path: &Path) -> bool {
        self.reason(name, source_path).is_some()
    }
}
