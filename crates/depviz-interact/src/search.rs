//! Fuzzy label search with a cycling cursor

use depviz_core::{GraphStore, NodeId};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Ids whose label matches `query`, best score first, ties by label.
pub fn find(store: &GraphStore, query: &str) -> Vec<NodeId> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str, &NodeId)> = store
        .nodes()
        .filter_map(|n| fuzzy_match_score(&matcher, &n.label, query).map(|s| (s, n.label.as_str(), &n.id)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)).then_with(|| a.2.cmp(b.2)));
    scored.into_iter().map(|(_, _, id)| id.clone()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct Search {
    query: String,
    hits: Vec<NodeId>,
    cursor: Option<usize>,
}

impl Search {
    /// Run a new query; returns the number of hits.
    pub fn set_query(&mut self, store: &GraphStore, query: &str) -> usize {
        self.query = query.to_string();
        self.hits = find(store, query);
        self.cursor = None;
        self.hits.len()
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn hits(&self) -> &[NodeId] {
        &self.hits
    }

    pub fn current(&self) -> Option<&NodeId> {
        self.hits.get(self.cursor?)
    }

    pub fn next(&mut self) -> Option<&NodeId> {
        if self.hits.is_empty() {
            return None;
        }
        let next = self.cursor.map_or(0, |c| (c + 1) % self.hits.len());
        self.cursor = Some(next);
        self.hits.get(next)
    }

    pub fn prev(&mut self) -> Option<&NodeId> {
        if self.hits.is_empty() {
            return None;
        }
        let len = self.hits.len();
        let prev = self.cursor.map_or(len - 1, |c| (c + len - 1) % len);
        self.cursor = Some(prev);
        self.hits.get(prev)
    }

    /// Drop hits for nodes that no longer exist.
    pub fn retain_existing(&mut self, store: &GraphStore) {
        let current = self.current().cloned();
        self.hits.retain(|id| store.contains(id));
        self.cursor = current.and_then(|c| self.hits.iter().position(|h| h == &c));
    }

    pub fn clear(&mut self) {
        *self = Search::default();
    }
}
