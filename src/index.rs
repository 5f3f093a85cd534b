//! Index page generation.
//!
//! Writes one `index.html` per directory reachable from the index root, at the
//! mirrored location under the output root. The index root is the output tree
//! by default (so listings describe exactly what was published) or the live
//! source tree, see [`IndexSource`](crate::config::IndexSource).
//!
//! ## Page Format
//!
//! Pages are plain HTML, one element per line, no trailing newline:
//!
//! ```text
//! <html>
//! <head><title>Index of sub</title></head>
//! <body>
//! <h1>Index of sub</h1>
//! <ul>
//! <li><a href="../index.html">..</a></li>
//! <li><a href="deeper/index.html">deeper/</a></li>
//! <li><a href="b.txt">b.txt</a></li>
//! </ul>
//! </body>
//! </html>
//! ```
//!
//! - The title is the directory's path relative to the index root; the root
//!   itself is `.`.
//! - The `..` link is present everywhere except the root.
//! - Entries are sorted by raw file name (byte order, so case-sensitive).
//!   Directories link to their own index, files link to themselves.
//!
//! HTML is built with maud, so names containing `&`, `<`, `>` or `"` are
//! escaped; any other name is emitted as-is.
//!
//! A name that is not valid UTF-8 cannot be written into the page verbatim.
//! Its link target is percent-encoded from the raw bytes, so a server still
//! resolves it to the copied file; the link text shows the lossy rendering.

use crate::config::MirrorConfig;
use crate::exclude::Exclusion;
use log::{debug, info};
use maud::{Markup, html};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Cannot list {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Walked outside the index root: {}", .0.display())]
    OutsideRoot(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One visible child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// List the non-excluded children of `dir`, sorted by name.
///
/// `source_equivalent` is where `dir` lives (or would live) under the source
/// root; exclusion rules are checked against that location.
pub fn list_entries(
    dir: &Path,
    source_equivalent: &Path,
    exclusion: &Exclusion,
) -> Result<Vec<Entry>, IndexError> {
    let read_err = |source: io::Error| IndexError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for child in fs::read_dir(dir).map_err(read_err)? {
        let child = child.map_err(read_err)?;
        let name = child.file_name();
        if exclusion.is_excluded(&name, &source_equivalent.join(&name)) {
            continue;
        }
        // Follows links, matching the snapshot walk.
        let kind = if child.path().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(Entry { name, kind });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Render the index page for the directory at `relative` (empty for the root).
pub fn render_index(relative: &Path, entries: &[Entry]) -> String {
    let is_root = relative.as_os_str().is_empty();
    let heading = if is_root {
        ".".to_string()
    } else {
        relative.display().to_string()
    };

    let page = html! {
        html {
            "\n"
            head { title { "Index of " (heading) } }
            "\n"
            body {
                "\n"
                h1 { "Index of " (heading) }
                "\n"
                ul {
                    "\n"
                    @if !is_root {
                        li { a href="../index.html" { ".." } }
                        "\n"
                    }
                    @for entry in entries {
                        (render_entry(entry))
                        "\n"
                    }
                }
                "\n"
            }
            "\n"
        }
    };
    page.into_string()
}

fn render_entry(entry: &Entry) -> Markup {
    let name = entry.name.to_string_lossy().into_owned();
    let target = link_target(&entry.name);
    html! {
        @match entry.kind {
            EntryKind::Directory => {
                li { a href={ (target) "/" (INDEX_FILE) } { (name) "/" } }
            },
            EntryKind::File => {
                li { a href=(target) { (name) } }
            },
        }
    }
}

/// The `href` for a name: the name itself, or its percent-encoded bytes when
/// it is not valid UTF-8.
fn link_target(name: &OsStr) -> String {
    match name.to_str() {
        Some(text) => text.to_owned(),
        None => percent_encode(name.as_encoded_bytes()),
    }
}

fn percent_encode(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 3);
    for &byte in bytes {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Write `html` to `output_root/relative/index.html`, creating directories.
pub fn write_index(output_root: &Path, relative: &Path, html: &str) -> Result<PathBuf, IndexError> {
    let dir = output_root.join(relative);
    fs::create_dir_all(&dir).map_err(|source| IndexError::Write {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(INDEX_FILE);
    fs::write(&path, html).map_err(|source| IndexError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write an index for every directory reachable from the configured index root.
///
/// Returns the written index paths relative to the output root, in walk order.
pub fn generate_indexes(config: &MirrorConfig) -> Result<Vec<PathBuf>, IndexError> {
    let index_root = config.index_root();
    let source_root = config.source_root();
    let exclusion = config.exclusion();

    info!(
        "Indexing {} ({} tree)",
        index_root.display(),
        config.index_source().as_str()
    );

    let walker = WalkDir::new(index_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            if !entry.file_type().is_dir() {
                return false;
            }
            entry
                .path()
                .strip_prefix(index_root)
                .map(|relative| {
                    !exclusion.is_excluded(entry.file_name(), &source_root.join(relative))
                })
                .unwrap_or(false)
        });

    let mut written = Vec::new();
    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(index_root)
            .map_err(|_| IndexError::OutsideRoot(entry.path().to_path_buf()))?;

        // Listed before the page is written, so a page never lists itself.
        let entries = list_entries(entry.path(), &source_root.join(relative), exclusion)?;
        let page = render_index(relative, &entries);
        write_index(config.output_root(), relative, &page)?;

        let index_path = relative.join(INDEX_FILE);
        debug!("Wrote {}", index_path.display());
        written.push(index_path);
    }

    Ok(written)
}
