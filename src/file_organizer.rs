/// Moving discovered files into the destination's category folders.
///
/// A [`Relocator`] owns all per-run mutable state (the collision counter and
/// the extension sets) and runs in two phases:
///
/// 1. every file whose extension belongs to a declared category is moved
///    there, and archives are extracted;
/// 2. the source tree is swept again and again, moving whatever is still
///    there into `other/`, until a pass finds nothing or the source is gone.
use crate::archive::{self, UnpackOutcome};
use crate::config::DestinationRoot;
use crate::file_category::{Category, CategoryTable};
use crate::normalize::normalize;
use crate::output::OutputFormatter;
use crate::traversal::{self, FileRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker inserted into the name of an archive that could not be unpacked.
pub const EXTRACTION_ERROR_MARKER: &str = "(ERROR)";

/// Errors that can occur during file relocation.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Extracting an archive failed for a reason other than the archive itself.
    ExtractionFailed {
        archive: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
    /// Removing an extracted archive failed.
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Listing the source tree failed.
    TraversalFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::ExtractionFailed {
                archive,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to extract {} into {}: {}",
                    archive.display(),
                    destination.display(),
                    source
                )
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::TraversalFailed { path, source } => {
                write!(f, "Failed to list {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            Self::ExtractionFailed { source, .. }
            | Self::RemoveFailed { source, .. }
            | Self::TraversalFailed { source, .. } => Some(source),
        }
    }
}

/// Result type for file relocation operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What a relocation run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationSummary {
    /// Extensions that matched a declared category.
    pub known_extensions: BTreeSet<String>,
    /// Extensions of files that ended up in the catch-all via the sweep.
    pub unknown_extensions: BTreeSet<String>,
    /// Files moved (into any category, including the catch-all).
    pub moved: usize,
    /// Archives extracted successfully.
    pub extracted: usize,
    /// Archives moved to the catch-all because they could not be unpacked.
    pub failed_archives: Vec<PathBuf>,
    /// Times a destination name was taken and a suffix was needed.
    pub collisions: u32,
    /// Leftover-sweep passes that found files.
    pub sweep_passes: usize,
    /// Whether the sweep stopped at its pass bound with files still in place.
    pub sweep_exhausted: bool,
}

/// Builds `stem[(suffix)][(n)].ext`, omitting empty parts.
fn compose_name(stem: &str, marker: Option<&str>, counter: Option<u32>, ext: &str) -> String {
    let mut name = String::from(stem);
    if let Some(marker) = marker {
        name.push_str(marker);
    }
    if let Some(n) = counter {
        name.push_str(&format!("({})", n));
    }
    if name.is_empty() {
        name.push('_');
    }
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Moves a file or symlink, falling back to copy + remove across filesystems.
fn move_entry(from: &Path, to: &Path) -> OrganizeResult<()> {
    let failure = |e: io::Error| OrganizeError::FileMoveFailure {
        source: from.to_path_buf(),
        destination: to.to_path_buf(),
        source_error: e,
    };
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).map_err(failure)?;
            fs::remove_file(from).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

/// Relocates one run's worth of files from a source tree into a destination root.
pub struct Relocator<'a> {
    source: &'a Path,
    destination: &'a DestinationRoot,
    table: &'a CategoryTable,
    max_sweep_passes: usize,
    list_leftovers: ListFn,
    counter: u32,
    summary: RelocationSummary,
}

/// Lists the files under a root, skipping an excluded subtree.
type ListFn = fn(&Path, Option<&Path>) -> io::Result<Vec<FileRecord>>;

impl<'a> Relocator<'a> {
    /// Creates a relocator. The destination scaffold must already exist.
    pub fn new(
        source: &'a Path,
        destination: &'a DestinationRoot,
        table: &'a CategoryTable,
        max_sweep_passes: usize,
    ) -> Self {
        Self {
            source,
            destination,
            table,
            max_sweep_passes: max_sweep_passes.max(1),
            list_leftovers: traversal::list_files_excluding,
            counter: 0,
            summary: RelocationSummary::default(),
        }
    }

    /// Relocates `files`, then sweeps the source tree until it holds no files.
    ///
    /// Categories are processed in table order. Files with an extension no
    /// category declares are left for the sweep.
    pub fn relocate(mut self, files: &[FileRecord]) -> OrganizeResult<RelocationSummary> {
        let table = self.table;
        for category in table.categories().filter(|c| !c.is_catch_all()) {
            for file in files
                .iter()
                .filter(|f| table.category_for(&f.extension) == category)
            {
                self.summary.known_extensions.insert(file.extension.clone());
                if category == Category::Archive {
                    self.unpack_archive(file)?;
                } else {
                    self.move_to_category(file, category)?;
                }
            }
        }
        info!(
            moved = self.summary.moved,
            extracted = self.summary.extracted,
            "category pass done"
        );

        self.sweep_leftovers()?;
        Ok(self.summary)
    }

    /// First free path in `dir` for `stem`/`ext`, bumping the run counter on
    /// every taken candidate.
    fn free_path(&mut self, dir: &Path, stem: &str, marker: Option<&str>, ext: &str) -> PathBuf {
        let mut candidate = dir.join(compose_name(stem, marker, None, ext));
        while candidate.exists() || candidate.is_symlink() {
            self.counter += 1;
            self.summary.collisions += 1;
            candidate = dir.join(compose_name(stem, marker, Some(self.counter), ext));
        }
        candidate
    }

    fn move_to_category(&mut self, file: &FileRecord, category: Category) -> OrganizeResult<()> {
        let dir = self.destination.category_dir(category);
        let target = self.free_path(&dir, &normalize(&file.stem), None, &file.extension);
        move_entry(&file.path, &target)?;
        debug!(from = %file.path.display(), to = %target.display(), "moved");
        self.summary.moved += 1;
        Ok(())
    }

    fn unpack_archive(&mut self, file: &FileRecord) -> OrganizeResult<()> {
        let dir = self.destination.category_dir(Category::Archive);
        let target = self.free_path(&dir, &normalize(&file.stem), None, "");

        let outcome =
            archive::unpack(&file.path, &target).map_err(|e| OrganizeError::ExtractionFailed {
                archive: file.path.clone(),
                destination: target.clone(),
                source: e,
            })?;

        match outcome {
            UnpackOutcome::Extracted { files } => {
                fs::remove_file(&file.path).map_err(|e| OrganizeError::RemoveFailed {
                    path: file.path.clone(),
                    source: e,
                })?;
                debug!(archive = %file.path.display(), to = %target.display(), files, "extracted");
                self.summary.extracted += 1;
            }
            failed => {
                warn!(archive = %file.path.display(), reason = %failed, "archive not unpacked");
                OutputFormatter::error(&format!("*** Archive unpacking error: {} ***", failed));
                let other = self.destination.category_dir(Category::Other);
                let target = self.free_path(
                    &other,
                    &file.stem,
                    Some(EXTRACTION_ERROR_MARKER),
                    &file.extension,
                );
                move_entry(&file.path, &target)?;
                self.summary.moved += 1;
                self.summary.failed_archives.push(target);
            }
        }
        Ok(())
    }

    /// Moves everything still under the source root into `other/`, pass after
    /// pass, until a pass finds nothing, the root is gone, or the bound hits.
    fn sweep_leftovers(&mut self) -> OrganizeResult<()> {
        let source = self.source;
        let destination = self.destination;
        let other = destination.category_dir(Category::Other);
        let exclude = Some(destination.path()).filter(|d| d.starts_with(source));
        let list_leftovers = self.list_leftovers;

        for _ in 0..self.max_sweep_passes {
            let leftovers = list_leftovers(source, exclude).map_err(|e| {
                OrganizeError::TraversalFailed {
                    path: source.to_path_buf(),
                    source: e,
                }
            })?;
            if leftovers.is_empty() {
                return Ok(());
            }

            self.summary.sweep_passes += 1;
            debug!(
                pass = self.summary.sweep_passes,
                files = leftovers.len(),
                "sweeping leftovers"
            );
            for file in &leftovers {
                self.summary.unknown_extensions.insert(file.extension.clone());
                let target = self.free_path(&other, &file.stem, None, &file.extension);
                match move_entry(&file.path, &target) {
                    Ok(()) => self.summary.moved += 1,
                    // Only a source that vanished mid-pass is skipped; a missing
                    // target directory is a real failure.
                    Err(OrganizeError::FileMoveFailure { source_error, .. })
                        if source_error.kind() == io::ErrorKind::NotFound
                            && !file.path.exists()
                            && !file.path.is_symlink() =>
                    {
                        debug!(path = %file.path.display(), "vanished before it could be swept");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let remaining = list_leftovers(source, exclude).map_or(0, |files| files.len());
        if remaining > 0 {
            warn!(
                passes = self.max_sweep_passes,
                remaining, "leftover sweep hit its pass limit"
            );
            self.summary.sweep_exhausted = true;
        }
        Ok(())
    }
}
