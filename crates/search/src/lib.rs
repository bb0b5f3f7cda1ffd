//! Shoal search: incrementally-built fuzzy index per stream, with debounced
//! interactive queries and per-field character-offset match spans.

#![forbid(unsafe_code)]

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use shoal_core::ClusterEvent;
use smallvec::SmallVec;

pub mod highlight;

mod debounce;
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};

/// Minimum query length before the index answers at all; shorter queries
/// keep the live panel up instead of flashing noisy one-character matches.
pub const STREAM_MIN_QUERY: usize = 3;
pub const METRIC_MIN_QUERY: usize = 2;

/// Inclusive `(start, end)` character span within one field.
pub type Span = (usize, usize);

/// A searchable item: an ordered list of `(field name, text)` pairs.
pub trait Document {
    fn fields(&self) -> Vec<(&'static str, &str)>;
}

/// Events are matched across all four display fields.
impl Document for ClusterEvent {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("clusterName", &self.cluster_name),
            ("kind", &self.kind),
            ("objectName", &self.object_name),
            ("message", &self.message),
        ]
    }
}

/// Log lines are indexed by raw message text only.
impl Document for String {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("message", self)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: &'static str,
    pub spans: SmallVec<[Span; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Index into the stream's document list, in insertion order.
    pub doc: usize,
    pub score: i64,
    pub matches: Vec<FieldMatch>,
}

/// One index per searchable stream. `add` is incremental; the index is never
/// rebuilt from scratch as items stream in. `clear` accompanies session
/// teardown, since indexed items are invalid for the replacement session.
pub struct Index<D> {
    docs: Vec<D>,
    min_query_len: usize,
}

impl<D: Document> Index<D> {
    pub fn new(min_query_len: usize) -> Self {
        Self { docs: Vec::new(), min_query_len }
    }

    pub fn add(&mut self, doc: D) {
        self.docs.push(doc);
        metrics::gauge!("search_index_docs", self.docs.len() as f64);
    }

    pub fn clear(&mut self) {
        self.docs.clear();
        metrics::gauge!("search_index_docs", 0.0);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, doc: usize) -> Option<&D> {
        self.docs.get(doc)
    }

    /// Rank documents against `query`. `None` means the query is below the
    /// minimum length and the live view should stay as-is — which is not the
    /// same as an empty result list.
    pub fn query(&self, query: &str, limit: usize) -> Option<Vec<Hit>> {
        let q = query.trim();
        if q.chars().count() < self.min_query_len {
            return None;
        }
        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<Hit> = Vec::new();
        for (i, doc) in self.docs.iter().enumerate() {
            let mut score = 0i64;
            let mut matches: Vec<FieldMatch> = Vec::new();
            for (field, text) in doc.fields() {
                if let Some((field_score, indices)) = matcher.fuzzy_indices(text, q) {
                    score = score.max(field_score);
                    matches.push(FieldMatch { field, spans: highlight::group_spans(&indices) });
                }
            }
            if !matches.is_empty() {
                hits.push(Hit { doc: i, score, matches });
            }
        }
        // Stable ranking: score desc, then insertion order.
        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.doc.cmp(&b.doc)));
        hits.truncate(limit);
        metrics::histogram!("search_hits", hits.len() as f64);
        tracing::debug!(query = q, hits = hits.len(), docs = self.docs.len(), "index queried");
        Some(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(cluster: &str, kind: &str, name: &str, msg: &str) -> ClusterEvent {
        ClusterEvent {
            cluster_name: cluster.to_string(),
            kind: kind.to_string(),
            object_name: name.to_string(),
            message: msg.to_string(),
        }
    }

    #[test]
    fn short_query_returns_none_not_empty() {
        let mut idx: Index<ClusterEvent> = Index::new(STREAM_MIN_QUERY);
        idx.add(event("east", "Pod", "db-0", "Started container"));
        assert!(idx.query("st", 10).is_none());
        assert!(idx.query("  st  ", 10).is_none(), "whitespace does not count");
        let hits = idx.query("sta", 10).expect("long enough");
        assert!(!hits.is_empty());
    }

    #[test]
    fn incremental_add_is_visible_to_queries() {
        let mut idx: Index<String> = Index::new(STREAM_MIN_QUERY);
        assert_eq!(idx.query("panic", 10), Some(vec![]));
        idx.add("kernel panic in node-3".to_string());
        let hits = idx.query("panic", 10).expect("query runs");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc, 0);
    }

    #[test]
    fn event_hits_carry_per_field_spans() {
        let mut idx: Index<ClusterEvent> = Index::new(STREAM_MIN_QUERY);
        idx.add(event("east", "Pod", "db-0", "pulled image"));
        let hits = idx.query("pod", 10).expect("query runs");
        assert_eq!(hits.len(), 1);
        let m = &hits[0].matches;
        assert!(m.iter().any(|fm| fm.field == "kind" && !fm.spans.is_empty()));
    }

    #[test]
    fn exact_match_outranks_scattered_match() {
        let mut idx: Index<String> = Index::new(STREAM_MIN_QUERY);
        idx.add("r_e_b_a_l_a_n_c_e".to_string());
        idx.add("rebalance finished".to_string());
        let hits = idx.query("rebalance", 10).expect("query runs");
        assert_eq!(hits[0].doc, 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut idx: Index<String> = Index::new(STREAM_MIN_QUERY);
        idx.add("same line".to_string());
        idx.add("same line".to_string());
        let hits = idx.query("same", 10).expect("query runs");
        assert_eq!(hits[0].doc, 0);
        assert_eq!(hits[1].doc, 1);
    }

    #[test]
    fn clear_empties_the_index() {
        let mut idx: Index<String> = Index::new(STREAM_MIN_QUERY);
        idx.add("one".to_string());
        idx.add("two".to_string());
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.query("one", 10), Some(vec![]));
    }

    #[test]
    fn limit_truncates_after_ranking() {
        let mut idx: Index<String> = Index::new(STREAM_MIN_QUERY);
        for i in 0..20 {
            idx.add(format!("restart {i}"));
        }
        let hits = idx.query("restart", 5).expect("query runs");
        assert_eq!(hits.len(), 5);
    }
}
