//! Exporting entries as paginated documents.
//!
//! The store only decides *what* is exported (the freshly saved content) and
//! what the file should be called. Turning text into pages is the job of a
//! [`DocumentRenderer`]; [`PdfRenderer`] is the bundled one.

mod pdf;

pub use pdf::PdfRenderer;

use crate::constants::{
    DEFAULT_EXPORT_FONT, DEFAULT_EXPORT_FONT_SIZE, DEFAULT_LINE_HEIGHT_MULTIPLE,
    EXPORT_FILE_EXTENSION, EXPORT_TITLE_TRIM_CHARS, EXPORT_TITLE_WORDS,
};
use crate::errors::AppResult;

/// Typography for an exported document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Font family name, e.g. `Palatino`.
    pub font: String,
    /// Font size in points.
    pub font_size: f32,
    /// Distance between baselines as a multiple of `font_size`.
    pub line_height_multiple: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            font: DEFAULT_EXPORT_FONT.to_string(),
            font_size: DEFAULT_EXPORT_FONT_SIZE,
            line_height_multiple: DEFAULT_LINE_HEIGHT_MULTIPLE,
        }
    }
}

/// Output of a renderer.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// True when pagination stopped at the page limit.
    pub truncated: bool,
}

/// A rendered entry together with the filename suggested for it.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub document: RenderedDocument,
}

/// Paginates plain text into document bytes.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, text: &str, config: &RenderConfig) -> AppResult<RenderedDocument>;
}

/// Suggests a filename for an exported entry.
///
/// Uses the first four words of the content, with surrounding punctuation
/// stripped and lower-cased, joined by hyphens. Falls back to
/// `Entry <display date>` when the content has no words.
///
/// # Examples
///
/// ```
/// use freewrite::export::suggested_filename;
///
/// assert_eq!(
///     suggested_filename("Today, I finally (really) started running.", "Mar 4"),
///     "today-i-finally-really.pdf"
/// );
/// assert_eq!(suggested_filename("Hello world!", "Mar 4"), "hello-world.pdf");
/// assert_eq!(suggested_filename("  \n ", "Mar 4"), "Entry Mar 4.pdf");
/// ```
pub fn suggested_filename(content: &str, display_date: &str) -> String {
    let words: Vec<String> = content
        .split_whitespace()
        .map(|word| word.trim_matches(EXPORT_TITLE_TRIM_CHARS).to_lowercase())
        .filter(|word| !word.is_empty())
        .take(EXPORT_TITLE_WORDS)
        .collect();

    let stem = if words.is_empty() {
        format!("Entry {}", display_date)
    } else {
        words.join("-")
    };
    format!("{}.{}", stem, EXPORT_FILE_EXTENSION)
}
