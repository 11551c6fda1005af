//! Journal entries and the filename convention that identifies them.
//!
//! An entry's identity lives entirely in its filename:
//! `[<uuid>]-[<yyyy-MM-dd-HH-mm-ss>].md`. There is no index file, so every
//! piece of metadata the store needs besides the modification time is
//! recovered by parsing the name alone.

use crate::constants::{
    DISPLAY_DATE_FORMAT, ENTRY_FILE_EXTENSION, FILENAME_TIMESTAMP_FORMAT, PREVIEW_ELLIPSIS,
    PREVIEW_ERROR_TEXT, PREVIEW_MAX_CHARS,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;

static ID_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]").expect("entry id pattern is valid"));

static TIMESTAMP_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2})\]")
        .expect("entry timestamp pattern is valid")
});

/// Builds the filename for an entry.
///
/// # Examples
///
/// ```
/// use freewrite::entry::entry_filename;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let created = NaiveDate::from_ymd_opt(2024, 3, 4)
///     .unwrap()
///     .and_hms_opt(9, 5, 7)
///     .unwrap();
/// let name = entry_filename(Uuid::nil(), created);
/// assert_eq!(
///     name,
///     "[00000000-0000-0000-0000-000000000000]-[2024-03-04-09-05-07].md"
/// );
/// ```
pub fn entry_filename(id: Uuid, created_at: NaiveDateTime) -> String {
    format!(
        "[{}]-[{}].{}",
        id,
        created_at.format(FILENAME_TIMESTAMP_FORMAT),
        ENTRY_FILE_EXTENSION
    )
}

/// Recovers the id and creation time from an entry filename.
///
/// Returns `None` for anything that is not an entry: a non-`.md` file, a name
/// missing either bracketed group, an id that is not a UUID, or a timestamp
/// that is not a valid date-time. The UUID may be in any case.
pub fn parse_entry_filename(filename: &str) -> Option<(Uuid, NaiveDateTime)> {
    let extension = Path::new(filename).extension()?;
    if extension != ENTRY_FILE_EXTENSION {
        return None;
    }

    let id_group = ID_GROUP.captures(filename)?.get(1)?.as_str();
    let timestamp_group = TIMESTAMP_GROUP.captures(filename)?.get(1)?.as_str();

    let id = Uuid::parse_str(id_group).ok()?;
    let created_at =
        NaiveDateTime::parse_from_str(timestamp_group, FILENAME_TIMESTAMP_FORMAT).ok()?;
    Some((id, created_at))
}

/// Derives the one-line preview shown for an entry.
///
/// Newlines become spaces and surrounding whitespace is trimmed. Anything
/// longer than 30 characters is cut to 30 and marked with `...`.
///
/// # Examples
///
/// ```
/// use freewrite::entry::derive_preview;
///
/// assert_eq!(derive_preview("  short\nnote \n"), "short note");
/// assert_eq!(derive_preview(" \n\t "), "");
/// assert_eq!(
///     derive_preview("this sentence is definitely longer than thirty"),
///     "this sentence is definitely lo..."
/// );
/// ```
pub fn derive_preview(content: &str) -> String {
    let collapsed = content.replace('\n', " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        let mut preview: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
        preview.push_str(PREVIEW_ELLIPSIS);
        preview
    } else {
        trimmed.to_string()
    }
}

/// Load state of an entry's preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Preview {
    /// Nothing has been read yet.
    Unloaded,
    /// A background read is in flight.
    Loading,
    /// Derived from the file or from the last save.
    Ready(String),
    /// The file could not be read.
    Failed,
}

impl Preview {
    /// Text to show for this preview, if there is any.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Preview::Ready(text) => Some(text),
            Preview::Failed => Some(PREVIEW_ERROR_TEXT),
            Preview::Unloaded | Preview::Loading => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Preview::Ready(_) | Preview::Failed)
    }
}

/// A single journal entry, backed by exactly one file.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Identifier embedded in the filename.
    pub id: Uuid,
    /// Local creation time, second precision.
    pub created_at: NaiveDateTime,
    /// Name of the backing file inside the entries directory.
    pub filename: String,
    /// Full path of the backing file.
    pub path: PathBuf,
    /// Filesystem modification time as of the last scan.
    pub modified_at: DateTime<Local>,
    /// Cached preview text.
    pub preview: Preview,
    /// Sequence number of the save that produced `preview`.
    #[serde(skip)]
    pub(crate) preview_seq: u64,
}

impl Entry {
    /// Creates a brand new entry stamped with `now`.
    pub fn create(root: &Path, now: DateTime<Local>) -> Self {
        let id = Uuid::new_v4();
        let created_at = now.naive_local();
        let created_at = created_at.with_nanosecond(0).unwrap_or(created_at);
        let filename = entry_filename(id, created_at);

        Entry {
            id,
            created_at,
            path: root.join(&filename),
            filename,
            modified_at: now,
            preview: Preview::Unloaded,
            preview_seq: 0,
        }
    }

    /// Rebuilds an entry found on disk, keeping the filename exactly as found.
    pub fn from_file(root: &Path, filename: &str, modified_at: DateTime<Local>) -> Option<Self> {
        let (id, created_at) = parse_entry_filename(filename)?;
        Some(Entry {
            id,
            created_at,
            filename: filename.to_string(),
            path: root.join(filename),
            modified_at,
            preview: Preview::Unloaded,
            preview_seq: 0,
        })
    }

    /// Month and day of creation, e.g. `Mar 4`.
    pub fn display_date(&self) -> String {
        self.created_at.format(DISPLAY_DATE_FORMAT).to_string()
    }

    /// Whether the file was last modified on the given local calendar day.
    pub fn modified_on(&self, day: NaiveDate) -> bool {
        self.modified_at.date_naive() == day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_filename_round_trip() {
        for _ in 0..16 {
            let id = Uuid::new_v4();
            let name = entry_filename(id, sample_time());
            let (parsed_id, parsed_time) = parse_entry_filename(&name).unwrap();
            assert_eq!(parsed_id, id);
            assert_eq!(parsed_time, sample_time());
        }
    }

    #[test]
    fn test_created_entry_round_trips_to_the_second() {
        let now = Local.with_ymd_and_hms(2024, 6, 1, 23, 59, 58).unwrap()
            + chrono::Duration::milliseconds(750);
        let entry = Entry::create(Path::new("/journal"), now);

        let (id, created_at) = parse_entry_filename(&entry.filename).unwrap();
        assert_eq!(id, entry.id);
        assert_eq!(created_at, entry.created_at);
        assert_eq!(created_at.nanosecond(), 0);
        assert_eq!(created_at.second(), 58);
        assert_eq!(entry.path, Path::new("/journal").join(&entry.filename));
        assert_eq!(entry.preview, Preview::Unloaded);
    }

    #[test]
    fn test_parse_accepts_uppercase_uuid() {
        let name = "[6B0E1B2C-3F4A-4D5E-8F90-A1B2C3D4E5F6]-[2024-01-15-14-30-05].md";
        let (id, created_at) = parse_entry_filename(name).unwrap();
        assert_eq!(
            id,
            Uuid::parse_str("6b0e1b2c-3f4a-4d5e-8f90-a1b2c3d4e5f6").unwrap()
        );
        assert_eq!(created_at, sample_time());
    }

    #[test]
    fn test_from_file_keeps_original_filename() {
        let name = "[6B0E1B2C-3F4A-4D5E-8F90-A1B2C3D4E5F6]-[2024-01-15-14-30-05].md";
        let modified = Local.with_ymd_and_hms(2024, 1, 16, 8, 0, 0).unwrap();
        let entry = Entry::from_file(Path::new("/journal"), name, modified).unwrap();
        assert_eq!(entry.filename, name);
        assert_eq!(entry.path, Path::new("/journal").join(name));
        assert_eq!(entry.modified_at, modified);
    }

    #[test]
    fn test_parse_skips_non_entries() {
        let id = Uuid::new_v4();
        let rejected = [
            // wrong extension
            format!("[{}]-[2024-01-15-14-30-05].txt", id),
            // no extension at all
            format!("[{}]-[2024-01-15-14-30-05]", id),
            // missing timestamp group
            format!("[{}].md", id),
            // missing id group
            "[2024-01-15-14-30-05].md".to_string(),
            // id is not a uuid
            "[not-a-uuid]-[2024-01-15-14-30-05].md".to_string(),
            // timestamp has the right shape but is not a date
            format!("[{}]-[2024-13-45-25-61-61].md", id),
            // timestamp has the wrong shape
            format!("[{}]-[2024-01-15].md", id),
            "notes.md".to_string(),
            ".freewrite.lock".to_string(),
        ];

        for name in rejected {
            assert!(
                parse_entry_filename(&name).is_none(),
                "expected {name} to be skipped"
            );
        }
    }

    #[test]
    fn test_preview_short_content_is_trimmed() {
        assert_eq!(derive_preview("\n  hello world  \n"), "hello world");
        assert_eq!(derive_preview("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_preview_truncation_boundary() {
        let exactly_thirty = "a".repeat(30);
        assert_eq!(derive_preview(&exactly_thirty), exactly_thirty);

        let thirty_one = "b".repeat(31);
        assert_eq!(derive_preview(&thirty_one), format!("{}...", "b".repeat(30)));
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let content = "é".repeat(31);
        assert_eq!(derive_preview(&content), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_preview_whitespace_only_is_empty() {
        assert_eq!(derive_preview(""), "");
        assert_eq!(derive_preview("   \n\n \t"), "");
    }

    #[test]
    fn test_display_date() {
        let entry = Entry::from_file(
            Path::new("/journal"),
            &entry_filename(Uuid::new_v4(), sample_time()),
            Local::now(),
        )
        .unwrap();
        assert_eq!(entry.display_date(), "Jan 15");
    }

    #[test]
    fn test_preview_display_text() {
        assert_eq!(Preview::Unloaded.display_text(), None);
        assert_eq!(Preview::Loading.display_text(), None);
        assert_eq!(Preview::Ready(String::new()).display_text(), Some(""));
        assert_eq!(
            Preview::Failed.display_text(),
            Some("Error loading preview")
        );
        assert!(!Preview::Loading.is_loaded());
        assert!(Preview::Failed.is_loaded());
    }

    #[test]
    fn test_modified_on() {
        let modified = Local.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let entry = Entry::from_file(
            Path::new("/journal"),
            &entry_filename(Uuid::new_v4(), sample_time()),
            modified,
        )
        .unwrap();
        assert!(entry.modified_on(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert!(!entry.modified_on(NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()));
    }
}
