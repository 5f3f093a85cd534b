//! # dirmirror
//!
//! Builds a browsable static mirror of a directory tree: every eligible file is
//! copied into an output directory, and every directory level gets a plain
//! `index.html` listing its entries as links, including a link back to the
//! parent. Point any static file server at the output and the tree is
//! browsable.
//!
//! # Architecture
//!
//! ```text
//! 1. Clear   output root deleted and recreated (never updated in place)
//! 2. Copy    source/  →  dist/            verbatim, minus excluded entries
//! 3. Index   dist/    →  dist/**/index.html
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Resolves options (defaults, TOML file, CLI) into an immutable [`config::MirrorConfig`] |
//! | [`exclude`] | The exclusion predicate shared by copying and indexing |
//! | [`snapshot`] | Clears the output root and copies the source tree |
//! | [`index`] | Renders and writes one index page per directory |
//! | [`pipeline`] | Runs the stages in order and returns a [`pipeline::BuildReport`] |
//! | [`output`] | CLI output formatting of the report |
//!
//! # Design Decisions
//!
//! ## One Configuration Value
//!
//! Source root, output root and exclusion rules are resolved once into a
//! [`config::MirrorConfig`] and passed by reference to every stage. No stage
//! reads the working directory or the executable path on its own, so a full run
//! can be pointed at any temporary directory.
//!
//! ## Index What Was Published
//!
//! By default the index generator walks the freshly copied output tree rather
//! than the source. If the source changes between the copy and the index stage,
//! the pages still describe exactly what was copied. Indexing the live source is
//! available with `--index-from source`, which is also the only mode that works
//! without copying (`--no-copy`).
//!
//! ## Same Exclusion Everywhere
//!
//! Copying and indexing consult the same [`exclude::Exclusion`]. An index can
//! therefore never link to a file that was not copied. Path-based rules are
//! always checked against the source-side location of an entry, even while
//! walking the output tree.
//!
//! ## Iterative Traversal
//!
//! Both walks use `walkdir`, which keeps its own stack of open directories, so
//! deeply nested trees do not grow the call stack.

pub mod config;
pub mod exclude;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod test_helpers;
