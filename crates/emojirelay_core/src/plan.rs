//! Replacement planning against an immutable mapping snapshot.

use crate::document::{utf16_len, Document, StyleKind};
use crate::models::mapping::{EmojiMapping, MappingScope};
use crate::scan::SymbolCluster;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the planner leaves in place of a replaced cluster.
///
/// `RetainOriginal` keeps the cluster text visible under the rich-glyph
/// range (the platform renders the rich variant over it); `Placeholder`
/// substitutes a fixed string, which may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderPolicy {
    RetainOriginal,
    Placeholder(String),
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        PlaceholderPolicy::RetainOriginal
    }
}

/// Immutable per-document view of the mapping table.
///
/// Fetched once at the start of processing; channel-scoped rows shadow
/// global rows for the same symbol.
#[derive(Debug, Clone, Default)]
pub struct MappingSnapshot {
    global: HashMap<String, i64>,
    channel: HashMap<String, i64>,
}

impl MappingSnapshot {
    /// Build a snapshot for one channel from mapping rows.
    pub fn for_channel(mappings: &[EmojiMapping], channel_id: i64) -> Self {
        let mut snapshot = Self::default();
        for mapping in mappings {
            match mapping.scope {
                MappingScope::Global => {
                    snapshot
                        .global
                        .insert(mapping.emoji.clone(), mapping.custom_emoji_id);
                }
                MappingScope::Channel(id) if id == channel_id => {
                    snapshot
                        .channel
                        .insert(mapping.emoji.clone(), mapping.custom_emoji_id);
                }
                MappingScope::Channel(_) => {}
            }
        }
        snapshot
    }

    /// Resolve a cluster: channel scope first, global fallback.
    pub fn resolve(&self, cluster: &str) -> Option<i64> {
        self.channel
            .get(cluster)
            .or_else(|| self.global.get(cluster))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.channel.is_empty()
    }
}

/// One planned rewrite: delete `[start, end)`, insert `insert_text` with a
/// rich-glyph range tagged `custom_emoji_id` over the inserted span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub start: usize,
    pub end: usize,
    pub insert_text: String,
    pub custom_emoji_id: i64,
}

/// Ordered, non-overlapping rewrite operations for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    entries: Vec<PlanEntry>,
}

impl RewritePlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Test seam for hand-built plans; production plans come from [`plan`].
    #[cfg(test)]
    pub(crate) fn from_entries_unchecked(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    /// Net UTF-16 length change once every entry is applied.
    pub fn net_delta(&self) -> isize {
        self.entries
            .iter()
            .map(|e| utf16_len(&e.insert_text) as isize - (e.end - e.start) as isize)
            .sum()
    }
}

/// Compute the rewrite plan for one document.
///
/// Unmapped clusters are skipped; clusters already covered by a rich-glyph
/// range were converted by an earlier pass and are skipped too, which makes
/// repeated invocations on an unchanged document no-ops.
///
/// # Returns
/// Entries sorted ascending by `start`, non-overlapping (clusters from the
/// symbol index already are).
pub fn plan(
    doc: &Document,
    clusters: &[SymbolCluster],
    snapshot: &MappingSnapshot,
    policy: &PlaceholderPolicy,
) -> RewritePlan {
    let mut entries = Vec::new();
    for cluster in clusters {
        if covered_by_rich_glyph(doc, cluster) {
            continue;
        }
        let Some(custom_emoji_id) = snapshot.resolve(&cluster.text) else {
            continue;
        };
        let insert_text = match policy {
            PlaceholderPolicy::RetainOriginal => cluster.text.clone(),
            PlaceholderPolicy::Placeholder(text) => text.clone(),
        };
        entries.push(PlanEntry {
            start: cluster.start,
            end: cluster.end,
            insert_text,
            custom_emoji_id,
        });
    }
    RewritePlan { entries }
}

fn covered_by_rich_glyph(doc: &Document, cluster: &SymbolCluster) -> bool {
    doc.ranges().iter().any(|range| {
        matches!(range.kind, StyleKind::CustomEmoji { .. })
            && range.start <= cluster.start
            && cluster.end <= range.end
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StyleRange;
    use crate::scan::scan;

    fn mapping(emoji: &str, id: i64, scope: MappingScope) -> EmojiMapping {
        EmojiMapping::new(emoji, id, scope, None).expect("valid mapping")
    }

    fn plain(text: &str) -> Document {
        Document::new(text.to_string(), Vec::new()).expect("document")
    }

    #[test]
    fn channel_scope_shadows_global() {
        let rows = vec![
            mapping("😀", 501, MappingScope::Global),
            mapping("😀", 777, MappingScope::Channel(-100123)),
        ];
        let snapshot = MappingSnapshot::for_channel(&rows, -100123);
        assert_eq!(snapshot.resolve("😀"), Some(777));

        let other = MappingSnapshot::for_channel(&rows, -100999);
        assert_eq!(other.resolve("😀"), Some(501));
    }

    #[test]
    fn unmapped_clusters_are_skipped_silently() {
        let doc = plain("😀 🔥");
        let rows = vec![mapping("😀", 501, MappingScope::Global)];
        let snapshot = MappingSnapshot::for_channel(&rows, -1);
        let plan = plan(&doc, &scan(doc.text()), &snapshot, &PlaceholderPolicy::RetainOriginal);
        assert_eq!(plan.entries().len(), 1);
        assert_eq!(plan.entries()[0].custom_emoji_id, 501);
        assert_eq!((plan.entries()[0].start, plan.entries()[0].end), (0, 2));
    }

    #[test]
    fn retain_policy_keeps_cluster_text_and_has_zero_delta() {
        let doc = plain("hi 😀");
        let rows = vec![mapping("😀", 501, MappingScope::Global)];
        let snapshot = MappingSnapshot::for_channel(&rows, -1);
        let plan = plan(&doc, &scan(doc.text()), &snapshot, &PlaceholderPolicy::RetainOriginal);
        assert_eq!(plan.entries()[0].insert_text, "😀");
        assert_eq!(plan.net_delta(), 0);
    }

    #[test]
    fn placeholder_policy_substitutes_and_shifts() {
        let doc = plain("hi 😀");
        let rows = vec![mapping("😀", 501, MappingScope::Global)];
        let snapshot = MappingSnapshot::for_channel(&rows, -1);
        let empty = plan(
            &doc,
            &scan(doc.text()),
            &snapshot,
            &PlaceholderPolicy::Placeholder(String::new()),
        );
        assert_eq!(empty.entries()[0].insert_text, "");
        assert_eq!(empty.net_delta(), -2);
    }

    #[test]
    fn clusters_under_an_existing_rich_glyph_are_skipped() {
        let doc = Document::new(
            "hi 😀".to_string(),
            vec![StyleRange::new(StyleKind::CustomEmoji { id: 501 }, 3, 5)],
        )
        .expect("document");
        let rows = vec![mapping("😀", 501, MappingScope::Global)];
        let snapshot = MappingSnapshot::for_channel(&rows, -1);
        let plan = plan(&doc, &scan(doc.text()), &snapshot, &PlaceholderPolicy::RetainOriginal);
        assert!(plan.is_empty());
    }

    #[test]
    fn entries_are_sorted_ascending_without_overlap() {
        let doc = plain("😀a😀b😀");
        let rows = vec![mapping("😀", 501, MappingScope::Global)];
        let snapshot = MappingSnapshot::for_channel(&rows, -1);
        let plan = plan(&doc, &scan(doc.text()), &snapshot, &PlaceholderPolicy::RetainOriginal);
        assert_eq!(plan.entries().len(), 3);
        for pair in plan.entries().windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
