//! Formatted-text document model with UTF-16 offset arithmetic.
//!
//! All offsets are measured in UTF-16 code units (the platform's native
//! text-length unit), not bytes, chars, or visual characters. A single
//! emoji scalar outside the BMP occupies two units.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::mem::Discriminant;

/// Style kinds the rewrite pipeline preserves or inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    Bold,
    Italic,
    Strikethrough,
    Spoiler,
    Code,
    CustomEmoji { id: i64 },
}

/// Half-open `[start, end)` span of one style over the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRange {
    pub kind: StyleKind,
    pub start: usize,
    pub end: usize,
}

impl StyleRange {
    pub fn new(kind: StyleKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    fn shifted(self, delta: isize) -> Self {
        Self {
            kind: self.kind,
            start: offset_shifted(self.start, delta),
            end: offset_shifted(self.end, delta),
        }
    }
}

/// UTF-16 code-unit length of a string.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn offset_shifted(offset: usize, delta: isize) -> usize {
    // Callers only shift offsets at or beyond the deleted span, so the
    // result never goes negative.
    (offset as isize + delta) as usize
}

/// Byte index corresponding to a UTF-16 offset into `text`.
fn byte_offset_at(text: &str, utf16_offset: usize) -> Result<usize, AppError> {
    let mut units = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if units == utf16_offset {
            return Ok(byte_idx);
        }
        units += ch.len_utf16();
        if units > utf16_offset {
            return Err(AppError::PlanInvariantViolation(format!(
                "offset {} falls inside a surrogate pair",
                utf16_offset
            )));
        }
    }
    if units == utf16_offset {
        Ok(text.len())
    } else {
        Err(AppError::PlanInvariantViolation(format!(
            "offset {} beyond document length {}",
            utf16_offset, units
        )))
    }
}

/// An immutable formatted-text document: plain text plus style ranges.
///
/// Ranges of different kinds may overlap arbitrarily; ranges of the same
/// kind never overlap. Rewriting always produces a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    ranges: Vec<StyleRange>,
}

impl Document {
    /// Build a validated document.
    ///
    /// Ranges are sorted by position; empty or out-of-bounds ranges and
    /// overlapping ranges of the same kind are rejected.
    ///
    /// # Errors
    /// Returns `BadRequest` when range validation fails.
    pub fn new(text: String, mut ranges: Vec<StyleRange>) -> Result<Self, AppError> {
        let len = utf16_len(&text);
        for range in &ranges {
            if range.start >= range.end || range.end > len {
                return Err(AppError::BadRequest(format!(
                    "style range [{}, {}) invalid for text of {} units",
                    range.start, range.end, len
                )));
            }
        }
        ranges.sort_by_key(|r| (r.start, r.end));
        validate_same_kind_disjoint(&ranges)?;
        Ok(Self { text, ranges })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ranges(&self) -> &[StyleRange] {
        &self.ranges
    }

    /// Document length in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        utf16_len(&self.text)
    }

    /// Apply one edit and return the resulting document.
    ///
    /// Replaces `[edit_start, edit_end)` with `inserted_text`. Existing
    /// ranges ending at or before the edit are unchanged; ranges starting
    /// at or after it shift by the net length delta; a straddling range is
    /// split at the boundary and the portion inside the deleted span is
    /// dropped. A pure insertion (`edit_start == edit_end`) never drops a
    /// range; a range spanning the insertion point grows instead.
    ///
    /// `inserted_ranges` are expressed relative to `inserted_text` and are
    /// re-based to `edit_start`.
    ///
    /// # Errors
    /// Returns `PlanInvariantViolation` when an offset is out of bounds or
    /// does not land on a character boundary.
    pub fn apply_delta(
        &self,
        edit_start: usize,
        edit_end: usize,
        inserted_text: &str,
        inserted_ranges: &[StyleRange],
    ) -> Result<Document, AppError> {
        if edit_start > edit_end || edit_end > self.utf16_len() {
            return Err(AppError::PlanInvariantViolation(format!(
                "edit span [{}, {}) invalid for document of {} units",
                edit_start,
                edit_end,
                self.utf16_len()
            )));
        }
        let byte_start = byte_offset_at(&self.text, edit_start)?;
        let byte_end = byte_offset_at(&self.text, edit_end)?;

        let inserted_len = utf16_len(inserted_text);
        let delta = inserted_len as isize - (edit_end - edit_start) as isize;

        let mut text = String::with_capacity(
            self.text.len() - (byte_end - byte_start) + inserted_text.len(),
        );
        text.push_str(&self.text[..byte_start]);
        text.push_str(inserted_text);
        text.push_str(&self.text[byte_end..]);

        let mut ranges = Vec::with_capacity(self.ranges.len() + inserted_ranges.len());
        for range in &self.ranges {
            if edit_start == edit_end {
                // Pure insertion: nothing is deleted, nothing is dropped.
                if range.end <= edit_start {
                    ranges.push(*range);
                } else if range.start >= edit_start {
                    ranges.push(range.shifted(delta));
                } else {
                    ranges.push(StyleRange::new(
                        range.kind,
                        range.start,
                        offset_shifted(range.end, delta),
                    ));
                }
                continue;
            }

            if range.end <= edit_start {
                ranges.push(*range);
            } else if range.start >= edit_end {
                ranges.push(range.shifted(delta));
            } else {
                // Straddling: keep the portions outside the deleted span.
                if range.start < edit_start {
                    ranges.push(StyleRange::new(range.kind, range.start, edit_start));
                }
                if range.end > edit_end {
                    ranges.push(StyleRange::new(
                        range.kind,
                        offset_shifted(edit_end, delta),
                        offset_shifted(range.end, delta),
                    ));
                }
            }
        }

        for inserted in inserted_ranges {
            if inserted.start >= inserted.end || inserted.end > inserted_len {
                return Err(AppError::PlanInvariantViolation(format!(
                    "inserted range [{}, {}) invalid for insert of {} units",
                    inserted.start, inserted.end, inserted_len
                )));
            }
            ranges.push(StyleRange::new(
                inserted.kind,
                inserted.start + edit_start,
                inserted.end + edit_start,
            ));
        }

        Document::new(text, ranges)
    }
}

fn validate_same_kind_disjoint(sorted: &[StyleRange]) -> Result<(), AppError> {
    let mut last_end: HashMap<Discriminant<StyleKind>, usize> = HashMap::new();
    for range in sorted {
        let key = std::mem::discriminant(&range.kind);
        if let Some(&end) = last_end.get(&key) {
            if range.start < end {
                return Err(AppError::BadRequest(format!(
                    "overlapping ranges of the same kind at offset {}",
                    range.start
                )));
            }
        }
        let entry = last_end.entry(key).or_insert(0);
        if range.end > *entry {
            *entry = range.end;
        }
    }
    Ok(())
}
