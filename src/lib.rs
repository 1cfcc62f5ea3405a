//! sortdir - sort a messy folder into category folders
//!
//! This library walks an unsorted directory tree, classifies files by
//! extension, moves them into a fresh `sorted_<DD>_<MM>_<id>` directory with
//! one folder per category, unpacks archives, transliterates Cyrillic file
//! names and never overwrites anything on a name collision.

pub mod archive;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod normalize;
pub mod output;
pub mod traversal;

pub use cli::{ReportFormat, RunOutcome, RunReport, run_cli};
pub use config::{ConfigError, DestinationRoot, SortConfig};
pub use file_category::{Category, CategoryTable};
pub use file_organizer::{OrganizeError, RelocationSummary, Relocator};
pub use traversal::FileRecord;
