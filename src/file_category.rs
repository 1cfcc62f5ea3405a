/// Fixed category table used to classify files by extension.
///
/// Categories are checked in declaration order and the first one whose
/// extension list contains the (lowercased) extension wins. `Other` has no
/// extensions and catches everything else.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{Category, CategoryTable};
///
/// let table = CategoryTable::default();
/// assert_eq!(table.category_for("zip"), Category::Archive);
/// assert_eq!(table.category_for("JPG"), Category::Image);
/// assert_eq!(table.category_for("xyz"), Category::Other);
/// ```
use serde::Serialize;

/// A classification bucket. Each one becomes a folder in the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Archives that get unpacked (zip, gz, tar).
    Archive,
    /// Video files.
    Video,
    /// Databases, logs, CSV and other data dumps.
    Data,
    /// Audio files.
    Audio,
    /// Images and design files.
    Image,
    /// Documents and plain text.
    Text,
    /// Scripts.
    Script,
    /// Catch-all for unknown extensions and archives that failed to unpack.
    Other,
}

impl Category {
    /// All categories in table order, `Other` last.
    pub const ALL: [Category; 8] = [
        Category::Archive,
        Category::Video,
        Category::Data,
        Category::Audio,
        Category::Image,
        Category::Text,
        Category::Script,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Archive.dir_name(), "archive");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Archive => "archive",
            Category::Video => "video",
            Category::Data => "data",
            Category::Audio => "audio",
            Category::Image => "image",
            Category::Text => "text",
            Category::Script => "script",
            Category::Other => "other",
        }
    }

    /// True for the catch-all bucket.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "gz", "tar"];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "3gp", "3g2", "mpg", "mpeg", "m4v", "h264", "flv", "rm",
    "swf", "vob",
];

const DATA_EXTENSIONS: &[&str] = &[
    "sql", "sqlite", "sqlite3", "csv", "dat", "db", "log", "mdb", "sav", "xml",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "flac", "aif", "mid", "midi", "mpa", "wma", "wpl", "cda",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "png", "bmp", "ai", "psd", "ico", "jpeg", "svg", "tif", "tiff", "gif",
];

const TEXT_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "rtf", "tex", "wpd", "odt", "md"];

const SCRIPT_EXTENSIONS: &[&str] = &["py"];

/// Ordered mapping from category to its recognized extensions.
///
/// Immutable once built. The last entry is always `Other` with an empty
/// extension list.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<(Category, &'static [&'static str])>,
}

impl CategoryTable {
    /// Builds the built-in table.
    pub fn new() -> Self {
        Self {
            entries: vec![
                (Category::Archive, ARCHIVE_EXTENSIONS),
                (Category::Video, VIDEO_EXTENSIONS),
                (Category::Data, DATA_EXTENSIONS),
                (Category::Audio, AUDIO_EXTENSIONS),
                (Category::Image, IMAGE_EXTENSIONS),
                (Category::Text, TEXT_EXTENSIONS),
                (Category::Script, SCRIPT_EXTENSIONS),
                (Category::Other, &[]),
            ],
        }
    }

    /// Returns the first category whose extensions contain `extension`,
    /// comparing case-insensitively, or `Category::Other`.
    pub fn category_for(&self, extension: &str) -> Category {
        let extension = extension.to_lowercase();
        self.entries
            .iter()
            .find(|(_, extensions)| extensions.contains(&extension.as_str()))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }

    /// Iterates categories in table order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|(category, _)| *category)
    }

    /// Extensions declared for `category`.
    pub fn extensions(&self, category: Category) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, extensions)| *extensions)
            .unwrap_or(&[])
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}
