//! Run configuration and destination root naming.
//!
//! There is no configuration file and nothing is read from the environment:
//! a [`SortConfig`] is built from the command line and fixed for the run.
//!
//! # Destination layout
//!
//! Each run sorts into a fresh directory next to where it was started:
//!
//! ```text
//! <destination_parent>/sorted_<DD>_<MM>_<id>/
//!     archive/  video/  data/  audio/  image/  text/  script/  other/
//! ```
//!
//! `<id>` is the first eight hex digits of a random UUID, so two runs on the
//! same day never share a destination.

use crate::file_category::Category;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Default bound on leftover-sweep passes.
pub const DEFAULT_MAX_SWEEP_PASSES: usize = 64;

/// How many fresh ids are tried before giving up on a destination name.
const DESTINATION_ATTEMPTS: usize = 16;

/// Errors that can occur while preparing a run.
#[derive(Debug)]
pub enum ConfigError {
    /// The current working directory could not be determined.
    CurrentDir(std::io::Error),
    /// Every generated destination name was already taken.
    DestinationUnavailable { parent: PathBuf, attempts: usize },
    /// Creating the destination scaffold failed.
    ScaffoldFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::CurrentDir(e) => {
                write!(f, "Cannot determine current directory: {}", e)
            }
            ConfigError::DestinationUnavailable { parent, attempts } => write!(
                f,
                "No free destination name in {} after {} attempts",
                parent.display(),
                attempts
            ),
            ConfigError::ScaffoldFailed { path, source } => {
                write!(f, "Failed to create {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::CurrentDir(e) | ConfigError::ScaffoldFailed { source: e, .. } => Some(e),
            ConfigError::DestinationUnavailable { .. } => None,
        }
    }
}

/// Settings for one sorting run.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// The unsorted source directory.
    pub source: PathBuf,
    /// Directory the `sorted_*` destination is created in.
    pub destination_parent: PathBuf,
    /// Upper bound on leftover-sweep passes.
    pub max_sweep_passes: usize,
}

impl SortConfig {
    /// Config for `source`, sorting into the current working directory.
    pub fn new(source: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Ok(Self::with_destination_parent(source, cwd))
    }

    /// Config for `source`, sorting into `destination_parent`.
    pub fn with_destination_parent(
        source: impl Into<PathBuf>,
        destination_parent: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination_parent: destination_parent.into(),
            max_sweep_passes: DEFAULT_MAX_SWEEP_PASSES,
        }
    }

    /// Overrides the leftover-sweep bound. Zero is treated as one pass.
    pub fn max_sweep_passes(mut self, passes: usize) -> Self {
        self.max_sweep_passes = passes.max(1);
        self
    }
}

/// Builds the destination directory name for a run started at `now`.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use sortdir::config::destination_name;
///
/// let now = Local.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
/// assert_eq!(destination_name(now, "1a2b3c4d"), "sorted_07_03_1a2b3c4d");
/// ```
pub fn destination_name(now: DateTime<Local>, id: &str) -> String {
    format!("sorted_{}_{}", now.format("%d_%m"), id)
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// The per-run destination root. Fixed once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRoot {
    path: PathBuf,
}

impl DestinationRoot {
    /// Picks an unused `sorted_<DD>_<MM>_<id>` directory under `parent`.
    ///
    /// Nothing is created yet; see [`DestinationRoot::create_scaffold`].
    pub fn generate(parent: &Path, now: DateTime<Local>) -> Result<Self, ConfigError> {
        for _ in 0..DESTINATION_ATTEMPTS {
            let path = parent.join(destination_name(now, &short_id()));
            if !path.exists() {
                return Ok(Self { path });
            }
        }
        Err(ConfigError::DestinationUnavailable {
            parent: parent.to_path_buf(),
            attempts: DESTINATION_ATTEMPTS,
        })
    }

    /// Wraps an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory for `category` inside this root.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.path.join(category.dir_name())
    }

    /// Creates the root and one empty folder per category.
    pub fn create_scaffold(&self) -> Result<(), ConfigError> {
        for category in Category::ALL {
            let dir = self.category_dir(category);
            fs::create_dir_all(&dir).map_err(|e| ConfigError::ScaffoldFailed {
                path: dir.clone(),
                source: e,
            })?;
        }
        debug!(root = %self.path.display(), "destination scaffold created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 11, 5, 9, 30, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn test_destination_name_format() {
        assert_eq!(destination_name(fixed_now(), "deadbeef"), "sorted_05_11_deadbeef");
    }

    #[test]
    fn test_short_id_is_eight_hex_chars() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_is_under_parent_and_unused() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = DestinationRoot::generate(temp.path(), fixed_now()).expect("generate failed");

        assert_eq!(root.path().parent(), Some(temp.path()));
        assert!(!root.path().exists());
        let name = root.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sorted_05_11_"), "unexpected name {name}");
    }

    #[test]
    fn test_generate_twice_differs() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let first = DestinationRoot::generate(temp.path(), fixed_now()).unwrap();
        first.create_scaffold().unwrap();
        let second = DestinationRoot::generate(temp.path(), fixed_now()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_create_scaffold_makes_every_category() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = DestinationRoot::at(temp.path().join("dest"));
        root.create_scaffold().expect("scaffold failed");

        for category in Category::ALL {
            assert!(root.category_dir(category).is_dir(), "{category} missing");
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SortConfig::with_destination_parent("/in", "/out");
        assert_eq!(config.max_sweep_passes, DEFAULT_MAX_SWEEP_PASSES);
        assert_eq!(config.max_sweep_passes(0).max_sweep_passes, 1);
    }
}
