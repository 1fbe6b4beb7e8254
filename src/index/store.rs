//! Read-only index store contract for query evaluation

use crate::error::Result;
use crate::index::types::{DocId, Field, InvertedList};

/// Trait for reading posting lists and collection statistics from an index
///
/// Everything query evaluation needs from an index goes through this trait,
/// so the operator tree works the same over the in-memory index and any
/// future on-disk implementation. A missing (term, field) pair is not an
/// error; it yields an empty inverted list.
pub trait IndexStore: Send + Sync {
    /// Posting list for a term in a field, empty if the term never occurs
    fn inverted_list(&self, term: &str, field: Field) -> Result<InvertedList>;

    /// Total number of documents in the index
    fn doc_count(&self) -> u64;

    /// Number of documents that have the given field
    fn field_doc_count(&self, field: Field) -> u64;

    /// Length (token count) of a field in one document
    fn field_length(&self, field: Field, doc: DocId) -> Result<u64>;

    /// Total token count of a field across the collection
    fn total_field_length(&self, field: Field) -> u64;

    /// Average field length across documents that have the field
    fn avg_field_length(&self, field: Field) -> f64 {
        let docs = self.field_doc_count(field);
        if docs == 0 {
            0.0
        } else {
            self.total_field_length(field) as f64 / docs as f64
        }
    }

    /// External identifier of a document
    fn external_id(&self, doc: DocId) -> Result<String>;
}
