//! Grapheme-cluster symbol index.
//!
//! Detection operates on whole extended grapheme clusters, never on
//! individual code points, so a base emoji plus its skin-tone modifier,
//! ZWJ sequence, or variation selector is always one candidate.

use crate::document::utf16_len;
use unicode_segmentation::UnicodeSegmentation;

/// One candidate symbol occurrence, with UTF-16 code-unit offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCluster {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Scan plain text for symbol clusters in document order.
///
/// # Returns
/// Non-overlapping clusters sorted ascending by `start`.
pub fn scan(text: &str) -> Vec<SymbolCluster> {
    let mut clusters = Vec::new();
    let mut offset = 0usize;
    for grapheme in text.graphemes(true) {
        let len = utf16_len(grapheme);
        if is_symbol_cluster(grapheme) {
            clusters.push(SymbolCluster {
                text: grapheme.to_string(),
                start: offset,
                end: offset + len,
            });
        }
        offset += len;
    }
    clusters
}

/// Whether one extended grapheme cluster is a candidate symbol.
pub fn is_symbol_cluster(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_regional_indicator(first) {
        return true;
    }
    // Keycap sequences have an ASCII base (#, *, 0-9) plus U+20E3.
    if grapheme.chars().any(|c| c == '\u{20E3}') {
        return true;
    }
    is_symbol_scalar(first)
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

/// Scalar blocks treated as symbols.
///
/// Covers emoticons, pictographs, transport, dingbats, supplemental and
/// extended-A symbols, and the miscellaneous/enclosed blocks.
fn is_symbol_scalar(c: char) -> bool {
    matches!(c,
        '\u{1F600}'..='\u{1F64F}'
        | '\u{1F300}'..='\u{1F5FF}'
        | '\u{1F680}'..='\u{1F6FF}'
        | '\u{1F900}'..='\u{1F9FF}'
        | '\u{1FA70}'..='\u{1FAFF}'
        | '\u{2600}'..='\u{26FF}'
        | '\u{2700}'..='\u{27BF}'
        | '\u{1F170}'..='\u{1F251}'
        | '\u{2B00}'..='\u{2BFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_emoji_offsets_are_utf16() {
        let clusters = scan("hi 😀!");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "😀");
        assert_eq!((clusters[0].start, clusters[0].end), (3, 5));
    }

    #[test]
    fn skin_tone_modifier_is_one_cluster() {
        // 👍🏽 = U+1F44D U+1F3FD, four UTF-16 units.
        let clusters = scan("a👍🏽b");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "👍🏽");
        assert_eq!((clusters[0].start, clusters[0].end), (1, 5));
    }

    #[test]
    fn zwj_sequence_is_one_cluster() {
        let clusters = scan("👨‍👩‍👧");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "👨‍👩‍👧");
        assert_eq!(clusters[0].start, 0);
        assert_eq!(clusters[0].end, utf16_len("👨‍👩‍👧"));
    }

    #[test]
    fn flag_sequence_is_one_cluster() {
        let clusters = scan("go 🇸🇦 go");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "🇸🇦");
        assert_eq!((clusters[0].start, clusters[0].end), (3, 7));
    }

    #[test]
    fn keycap_sequence_is_one_cluster_but_bare_digits_are_not() {
        let clusters = scan("press 1️⃣ now");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text, "1️⃣");
        assert!(scan("press 1 now").is_empty());
    }

    #[test]
    fn plain_text_yields_no_clusters() {
        assert!(scan("").is_empty());
        assert!(scan("hello world").is_empty());
        assert!(scan("مرحبا بالعالم").is_empty());
    }

    #[test]
    fn clusters_come_back_in_document_order_without_overlap() {
        let clusters = scan("😀x🔥y❤️");
        let texts: Vec<&str> = clusters.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["😀", "🔥", "❤️"]);
        for pair in clusters.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
