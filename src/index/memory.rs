//! In-memory positional index
//!
//! Sufficient for tests and small corpora. Documents are assigned dense
//! ascending ids at insertion time, so posting lists come out in document
//! order without a sort step.

use std::collections::HashMap;

use tracing::debug;

use crate::config::TokenizerConfig;
use crate::error::{QuerentError, Result};
use crate::index::store::IndexStore;
use crate::index::types::{DocId, Field, InvertedList, Posting};
use crate::tokenizer::Tokenizer;

/// In-memory positional inverted index
pub struct MemoryIndex {
    tokenizer: Tokenizer,
    /// (field, term) -> postings in ascending doc order
    postings: HashMap<(Field, String), Vec<Posting>>,
    /// per-field token counts, indexed by doc id; None when the doc lacks the field
    field_lengths: HashMap<Field, Vec<Option<u64>>>,
    external_ids: Vec<String>,
}

impl MemoryIndex {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
            postings: HashMap::new(),
            field_lengths: HashMap::new(),
            external_ids: Vec::new(),
        }
    }

    /// Index a document given its external id and field texts
    ///
    /// Returns the internal id assigned to the document.
    pub fn add_document(&mut self, external_id: &str, fields: &[(Field, &str)]) -> DocId {
        let doc = self.external_ids.len() as DocId;
        self.external_ids.push(external_id.to_string());

        for lengths in self.field_lengths.values_mut() {
            lengths.resize(self.external_ids.len(), None);
        }

        for (field, text) in fields {
            let (terms, length) = self.tokenizer.tokenize_field(text);

            let lengths = self
                .field_lengths
                .entry(*field)
                .or_insert_with(|| vec![None; self.external_ids.len()]);
            lengths[doc as usize] = Some(length);

            let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
            for (term, pos) in terms {
                positions.entry(term).or_default().push(pos);
            }
            for (term, locs) in positions {
                self.postings
                    .entry((*field, term))
                    .or_default()
                    .push(Posting::new(doc, locs));
            }
        }

        debug!(doc, external_id, "indexed document");
        doc
    }

    /// Convenience for body-only corpora
    pub fn add_body(&mut self, external_id: &str, body: &str) -> DocId {
        self.add_document(external_id, &[(Field::Body, body)])
    }
}

impl IndexStore for MemoryIndex {
    fn inverted_list(&self, term: &str, field: Field) -> Result<InvertedList> {
        let mut list = InvertedList::empty(Some(field));
        if let Some(postings) = self.postings.get(&(field, term.to_string())) {
            for posting in postings {
                list.push(posting.clone());
            }
        }
        Ok(list)
    }

    fn doc_count(&self) -> u64 {
        self.external_ids.len() as u64
    }

    fn field_doc_count(&self, field: Field) -> u64 {
        self.field_lengths
            .get(&field)
            .map_or(0, |lengths| lengths.iter().filter(|l| l.is_some()).count() as u64)
    }

    fn field_length(&self, field: Field, doc: DocId) -> Result<u64> {
        if doc as usize >= self.external_ids.len() {
            return Err(QuerentError::DocumentNotFound(doc));
        }
        Ok(self
            .field_lengths
            .get(&field)
            .and_then(|lengths| lengths[doc as usize])
            .unwrap_or(0))
    }

    fn total_field_length(&self, field: Field) -> u64 {
        self.field_lengths
            .get(&field)
            .map_or(0, |lengths| lengths.iter().flatten().sum())
    }

    fn external_id(&self, doc: DocId) -> Result<String> {
        self.external_ids
            .get(doc as usize)
            .cloned()
            .ok_or(QuerentError::DocumentNotFound(doc))
    }
}
