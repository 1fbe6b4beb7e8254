//! Ranked result lists

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::Result;
use crate::index::{DocId, IndexStore};

/// One scored document
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub doc: DocId,
    pub score: f64,
}

/// Per-query result list
///
/// Entries are appended in ascending document order during evaluation and
/// sorted once at the end. The sort is stable and compares scores only, so
/// equal scores keep their ascending-document append order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScoreList {
    entries: Vec<ScoreEntry>,
}

impl ScoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, doc: DocId, score: f64) {
        self.entries.push(ScoreEntry { doc, score });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.entries.iter()
    }

    /// Sort descending by score, ties broken by append order
    pub fn sort(&mut self) {
        self.entries
            .sort_by_key(|e| std::cmp::Reverse(OrderedFloat(e.score)));
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Format as TREC run lines: `qid Q0 externalId rank score runId`
    ///
    /// An empty list still produces one placeholder line so downstream
    /// evaluation tools see every query id.
    pub fn format_trec(&self, qid: &str, run_id: &str, store: &dyn IndexStore) -> Result<String> {
        if self.entries.is_empty() {
            return Ok(format!("{qid} Q0 dummy 1 0 {run_id}\n"));
        }

        let mut out = String::new();
        for (rank, entry) in self.entries.iter().enumerate() {
            let external = store.external_id(entry.doc)?;
            out.push_str(&format!(
                "{qid} Q0 {external} {rank} {score:.12} {run_id}\n",
                rank = rank + 1,
                score = entry.score
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::index::{Field, MemoryIndex};

    #[test]
    fn test_ties_keep_append_order() {
        let mut list = ScoreList::new();
        list.push(1, 0.5);
        list.push(2, 0.9);
        list.push(3, 0.9);
        list.sort();

        let docs: Vec<_> = list.iter().map(|e| (e.doc, e.score)).collect();
        assert_eq!(docs, vec![(2, 0.9), (3, 0.9), (1, 0.5)]);
    }

    #[test]
    fn test_trec_formatting() {
        let mut index = MemoryIndex::new(&TokenizerConfig::default());
        index.add_document("doc-a", &[(Field::Body, "x")]);
        index.add_document("doc-b", &[(Field::Body, "y")]);

        let mut list = ScoreList::new();
        list.push(0, 0.25);
        list.push(1, 0.75);
        list.sort();

        let out = list.format_trec("7", "run1", &index).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("7 Q0 doc-b 1 "));
        assert!(lines[1].starts_with("7 Q0 doc-a 2 "));
    }

    #[test]
    fn test_empty_list_gets_placeholder_line() {
        let index = MemoryIndex::new(&TokenizerConfig::default());
        let list = ScoreList::new();
        let out = list.format_trec("7", "run1", &index).unwrap();
        assert_eq!(out, "7 Q0 dummy 1 0 run1\n");
    }
}
