//! Recursive directory listing.
//!
//! Every pass lists the tree from scratch: relocation mutates the tree between
//! passes, so nothing is cached. Entries that vanish while a pass is running
//! are skipped instead of failing the pass.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Width of the fallback extension heuristic for names without a usable suffix.
const FALLBACK_EXTENSION_WIDTH: usize = 3;

/// A file discovered by a traversal pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without the extension.
    pub stem: String,
    /// Lowercase extension without the dot. May be empty.
    pub extension: String,
}

impl FileRecord {
    /// Builds a record from a path, splitting its file name into stem and extension.
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, extension) = split_name(&name);
        Self {
            path,
            stem,
            extension,
        }
    }
}

/// Splits a file name into `(stem, lowercase extension)`.
///
/// Names with a non-empty stem and suffix around the last dot split there.
/// Everything else (no dot, dotfiles, trailing dot) falls back to the
/// fixed-width heuristic: the last three characters, trimmed of leading dots,
/// are the extension and the rest, trimmed of trailing dots, is the stem.
///
/// ```
/// use sortdir::traversal::split_name;
///
/// assert_eq!(split_name("report.docx"), ("report".to_string(), "docx".to_string()));
/// assert_eq!(split_name("notes"), ("no".to_string(), "tes".to_string()));
/// ```
pub fn split_name(name: &str) -> (String, String) {
    if let Some((stem, ext)) = name.rsplit_once('.')
        && !stem.is_empty()
        && !ext.is_empty()
    {
        return (stem.to_string(), ext.to_lowercase());
    }

    let chars: Vec<char> = name.chars().collect();
    let cut = chars.len().saturating_sub(FALLBACK_EXTENSION_WIDTH);
    let stem: String = chars[..cut].iter().collect();
    let ext: String = chars[cut..].iter().collect();
    (
        stem.trim_end_matches('.').to_string(),
        ext.trim_start_matches('.').to_lowercase(),
    )
}

/// Lists every non-directory entry under `root`, depth first, in name order.
///
/// A missing root yields an empty listing.
pub fn list_files(root: &Path) -> io::Result<Vec<FileRecord>> {
    list_files_excluding(root, None)
}

/// Like [`list_files`], but never descends into `exclude`.
///
/// Used when the destination root was created inside the source tree.
pub fn list_files_excluding(root: &Path, exclude: Option<&Path>) -> io::Result<Vec<FileRecord>> {
    let mut files = Vec::new();
    match fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => walk(root, exclude, &mut files)?,
        Ok(_) => files.push(FileRecord::from_path(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    Ok(files)
}

fn walk(dir: &Path, exclude: Option<&Path>, files: &mut Vec<FileRecord>) -> io::Result<()> {
    for entry in sorted_entries(dir)? {
        let path = entry.path();
        if exclude.is_some_and(|skip| path == skip) {
            continue;
        }
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if file_type.is_dir() {
            walk(&path, exclude, files)?;
        } else {
            files.push(FileRecord::from_path(path));
        }
    }
    Ok(())
}

/// Reads a directory's entries sorted by name. A directory that disappeared
/// reads as empty.
fn sorted_entries(dir: &Path) -> io::Result<Vec<fs::DirEntry>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut entries = Vec::new();
    for entry in read {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Renders the tree under `root` as an indented listing.
///
/// Directories print as `/<name>/`, indented by depth; files print after a
/// right-aligned pipe with one underscore per level.
pub fn render_tree(root: &Path) -> io::Result<String> {
    let mut out = String::new();
    render_into(root, 0, &mut out)?;
    Ok(out)
}

fn render_into(path: &Path, depth: usize, out: &mut String) -> io::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let margin = "_".repeat(depth);

    if path.is_dir() {
        let fold = " ".repeat(depth);
        out.push_str(&format!("{fold}{margin}/{name}/\n"));
        for entry in sorted_entries(path)? {
            render_into(&entry.path(), depth + 1, out)?;
        }
    } else {
        out.push_str(&format!("{:>7}{margin}{name}\n", "|"));
    }
    Ok(())
}

/// Outcome of [`remove_empty_dirs`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Directories removed, deepest first.
    pub removed: Vec<PathBuf>,
    /// Whether `root` itself was removed.
    pub root_removed: bool,
}

/// Removes empty directories under `root` bottom-up, then `root` if it ended
/// up empty. Directories that still hold files are left in place, and `keep`
/// (the destination, when it lives inside the source) is never touched.
pub fn remove_empty_dirs(root: &Path, keep: Option<&Path>) -> io::Result<CleanupReport> {
    let mut report = CleanupReport::default();
    if !root.is_dir() {
        return Ok(report);
    }
    report.root_removed = prune(root, keep, &mut report.removed)?;
    Ok(report)
}

fn prune(dir: &Path, keep: Option<&Path>, removed: &mut Vec<PathBuf>) -> io::Result<bool> {
    let mut empty = true;
    for entry in sorted_entries(dir)? {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir || keep.is_some_and(|k| path == k) || !prune(&path, keep, removed)? {
            empty = false;
        }
    }
    if empty {
        fs::remove_dir(dir)?;
        removed.push(dir.to_path_buf());
    }
    Ok(empty)
}
