//! Shared test utilities.
//!
//! Builds small source trees inside temp directories and inspects the
//! generated output.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file(tmp.path(), "sub/b.txt", "beta");
//! let config = config_for(tmp.path());
//! let report = build(&config).unwrap();
//!
//! assert_eq!(link_texts(&read_index(config.output_root(), "sub")), vec!["..", "b.txt"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{MirrorConfig, MirrorOptions};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Default configuration rooted at `source`: output into `dist`, index the output.
pub fn config_for(source: &Path) -> MirrorConfig {
    MirrorConfig::resolve(MirrorOptions {
        source: source.to_path_buf(),
        ..MirrorOptions::default()
    })
    .unwrap()
}

// =========================================================================
// Output inspection
// =========================================================================

/// Every path under `root`, relative, sorted; directories end with `/`.
pub fn tree_listing(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap();
            let mut text = relative.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                text.push('/');
            }
            text
        })
        .collect();
    paths.sort();
    paths
}

/// Read `root/relative/index.html`. Panics with the path on a miss.
pub fn read_index(root: &Path, relative: &str) -> String {
    let path = root.join(relative).join("index.html");
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("index {} not readable: {err}", path.display()))
}

/// Link texts of every `<a>` element, in document order.
pub fn link_texts(html: &str) -> Vec<String> {
    anchors(html).into_iter().map(|(_, text)| text).collect()
}

/// Link targets of every `<a>` element, in document order.
pub fn link_targets(html: &str) -> Vec<String> {
    anchors(html).into_iter().map(|(href, _)| href).collect()
}

fn anchors(html: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find("<a href=\"") {
        rest = &rest[start + "<a href=\"".len()..];
        let href_end = rest.find("\">").expect("unterminated href");
        let href = rest[..href_end].to_string();
        rest = &rest[href_end + 2..];
        let text_end = rest.find("</a>").expect("unterminated anchor");
        found.push((href, rest[..text_end].to_string()));
        rest = &rest[text_end..];
    }
    found
}
