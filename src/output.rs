//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, the destination tree and the extension summary.

use crate::file_organizer::RelocationSummary;
use colored::*;
use std::collections::BTreeSet;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - The destination tree and the final extension report
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Sorted into ./sorted_05_11_1a2b3c4d");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::error("*** Archive unpacking error: corrupt archive ***");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol to stderr.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a pre-rendered directory tree.
    pub fn tree(rendered: &str) {
        print!("{}", rendered);
    }

    /// Formats a sorted extension set as `[a, b, c]`.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use sortdir::output::OutputFormatter;
    ///
    /// let set = BTreeSet::from(["zip".to_string(), "docx".to_string()]);
    /// assert_eq!(OutputFormatter::extension_list(&set), "[docx, zip]");
    /// ```
    pub fn extension_list(extensions: &BTreeSet<String>) -> String {
        let items: Vec<&str> = extensions.iter().map(String::as_str).collect();
        format!("[{}]", items.join(", "))
    }

    /// Prints the known and unknown extension lines.
    pub fn extension_summary(summary: &RelocationSummary) {
        println!(
            "{} {}",
            "Known extensions:".bold(),
            Self::extension_list(&summary.known_extensions)
        );
        println!(
            "{} {}",
            "Unknown extensions:".bold(),
            Self::extension_list(&summary.unknown_extensions)
        );
    }
}
