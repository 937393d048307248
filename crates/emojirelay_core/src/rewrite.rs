//! Left-to-right rewrite pass over a planned document.

use crate::document::{utf16_len, Document, StyleKind, StyleRange};
use crate::error::AppError;
use crate::plan::RewritePlan;

/// Apply a rewrite plan and return the new document.
///
/// Entries are processed strictly in ascending `start` order while a
/// running delta tracks the net length change of everything applied so
/// far; the true edit position of an entry is `entry.start + delta`. This
/// single pass never rescans its own output, so rich-glyph content
/// inserted here cannot be matched again.
///
/// # Errors
/// Returns `PlanInvariantViolation` when entries are out of order,
/// overlapping, or reference positions beyond the then-current document
/// length. The input document is left untouched on failure.
pub fn apply(doc: &Document, plan: &RewritePlan) -> Result<Document, AppError> {
    let mut current = doc.clone();
    let mut delta: isize = 0;
    let mut prev_end = 0usize;

    for entry in plan.entries() {
        if entry.end < entry.start {
            return Err(AppError::PlanInvariantViolation(format!(
                "inverted plan entry [{}, {})",
                entry.start, entry.end
            )));
        }
        if entry.start < prev_end {
            return Err(AppError::PlanInvariantViolation(format!(
                "plan entry at {} overlaps or precedes the previous entry ending at {}",
                entry.start, prev_end
            )));
        }
        prev_end = entry.end;

        let start = shifted(entry.start, delta)?;
        let end = shifted(entry.end, delta)?;
        if end > current.utf16_len() {
            return Err(AppError::PlanInvariantViolation(format!(
                "plan entry [{}, {}) beyond document length {}",
                start,
                end,
                current.utf16_len()
            )));
        }

        let inserted_len = utf16_len(&entry.insert_text);
        let inserted_ranges = if entry.insert_text.is_empty() {
            Vec::new()
        } else {
            vec![StyleRange::new(
                StyleKind::CustomEmoji {
                    id: entry.custom_emoji_id,
                },
                0,
                inserted_len,
            )]
        };

        current = current.apply_delta(start, end, &entry.insert_text, &inserted_ranges)?;
        delta += inserted_len as isize - (entry.end - entry.start) as isize;
    }

    Ok(current)
}

fn shifted(offset: usize, delta: isize) -> Result<usize, AppError> {
    let value = offset as isize + delta;
    usize::try_from(value).map_err(|_| {
        AppError::PlanInvariantViolation(format!(
            "offset {} shifted by {} goes negative",
            offset, delta
        ))
    })
}
