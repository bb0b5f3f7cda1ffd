//! Turning matcher output into display highlighting.

use smallvec::SmallVec;

use crate::Span;

/// Collapse the matcher's per-character indices into inclusive contiguous
/// spans. Input is sorted ascending, as `fuzzy_indices` produces it.
pub fn group_spans(indices: &[usize]) -> SmallVec<[Span; 4]> {
    let mut spans: SmallVec<[Span; 4]> = SmallVec::new();
    for &i in indices {
        match spans.last_mut() {
            Some((_, end)) if *end + 1 == i => *end = i,
            _ => spans.push((i, i)),
        }
    }
    spans
}

/// Wrap every matched span of `text` in `open`/`close` markers.
///
/// Spans are spliced back-to-front so earlier insertions don't shift the
/// offsets of spans still to be processed. Offsets are character offsets,
/// matching what the matcher reports.
pub fn wrap_spans(text: &str, spans: &[Span], open: &str, close: &str) -> String {
    if spans.is_empty() {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    let mut sorted: Vec<Span> = spans.to_vec();
    sorted.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end) in sorted {
        if start > end || end >= chars.len() {
            continue;
        }
        chars.splice(end + 1..end + 1, close.chars());
        chars.splice(start..start, open.chars());
    }
    chars.into_iter().collect()
}
