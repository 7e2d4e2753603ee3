//! Append-only technician notes.
//!
//! A work order's notes are one text block. Each new note is prefixed with
//! the local time it was written and added after a blank line; earlier notes
//! are never edited.

use chrono::NaiveDateTime;

/// `strftime` pattern for the note prefix, e.g. `14/03/2025 09:30`.
pub const NOTE_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

const NOTE_SEPARATOR: &str = "\n\n";

/// Append a timestamped note to an existing notes block.
///
/// Whitespace-only existing notes count as empty. The new note is trimmed
/// and rendered as `[DD/MM/YYYY HH:MM] note`.
///
/// ```
/// use chrono::NaiveDate;
/// use workbench_core::append_note;
///
/// let at = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// let notes = append_note(None, "Cliente aprovou orçamento", at);
/// assert_eq!(notes, "[14/03/2025 09:30] Cliente aprovou orçamento");
/// ```
#[must_use]
pub fn append_note(existing: Option<&str>, note: &str, at: NaiveDateTime) -> String {
    let entry = format!("[{}] {}", at.format(NOTE_TIMESTAMP_FORMAT), note.trim());

    match existing.map(str::trim_end).filter(|s| !s.trim().is_empty()) {
        Some(previous) => format!("{previous}{NOTE_SEPARATOR}{entry}"),
        None => entry,
    }
}
