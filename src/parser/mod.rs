//! Loading Go packages from disk.
//!
//! This module provides:
//! - `ParsedFile`: a tree-sitter tree together with its source
//! - `GoParser`: lowering of tree-sitter's Go syntax into [`crate::ast`]
//! - `load_package`: collection and parsing of one package directory

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::ast::SourceFile;

pub mod go;

pub use go::GoParser;

/// A parsed file with its source.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node. Sources are checked for UTF-8
    /// before lowering, so the fallback is never hit for lowered files.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Parse and lower a single Go source.
pub fn parse_source(path: &str, source: &[u8]) -> anyhow::Result<SourceFile> {
    let parser = GoParser::new();
    let parsed = parser.parse(Path::new(path), source)?;
    parser.lower(&parsed)
}

/// Collect the non-test `.go` files directly inside `dir`, sorted by path.
/// Subdirectories are separate packages and are not entered.
pub fn collect_files(
    dir: &Path,
    is_excluded: impl Fn(&Path) -> bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.ends_with(".go") || name.ends_with("_test.go") {
            continue;
        }
        if is_excluded(path) {
            debug!(file = %path.display(), "excluded");
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Parse every Go file of the package directory `dir`.
pub fn load_package(
    dir: &Path,
    is_excluded: impl Fn(&Path) -> bool,
) -> anyhow::Result<Vec<SourceFile>> {
    let files = collect_files(dir, is_excluded)?;
    if files.is_empty() {
        anyhow::bail!("no Go source files found in {}", dir.display());
    }

    let parser = GoParser::new();
    let mut sources = Vec::with_capacity(files.len());
    for path in &files {
        let source = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        let parsed = parser.parse(path, &source)?;
        let file = parser.lower(&parsed)?;
        debug!(
            file = %file.path,
            package = %file.package,
            funcs = file.funcs.len(),
            "parsed"
        );
        sources.push(file);
    }

    Ok(sources)
}
