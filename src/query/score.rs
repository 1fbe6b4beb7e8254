//! Score adapter: positional stream to per-document scalar score
//!
//! Wraps one positional node and scores its matches under the active
//! retrieval model. Collection statistics are read from the store once at
//! initialization; only tf and the document's field length vary per match.

use crate::error::Result;
use crate::index::{DocId, Field, IndexStore};
use crate::model::RetrievalModel;
use crate::query::iop::IopNode;

/// Collection statistics cached at initialization
#[derive(Clone, Copy, Debug, Default)]
struct LeafStats {
    df: u32,
    ctf: u64,
    corpus_len: f64,
    doc_count: f64,
    avg_doc_len: f64,
}

/// Bridges a positional node to the scoring algebra
#[derive(Clone, Debug)]
pub struct ScoreAdapter {
    iop: IopNode,
    stats: LeafStats,
}

impl ScoreAdapter {
    pub fn new(iop: IopNode) -> Self {
        Self {
            iop,
            stats: LeafStats::default(),
        }
    }

    pub fn display(&self) -> &str {
        &self.iop.display
    }

    pub fn field(&self) -> Field {
        self.iop.field
    }

    /// The wrapped positional node, for optimizer rewrites
    pub fn iop(&self) -> &IopNode {
        &self.iop
    }

    pub fn iop_mut(&mut self) -> &mut IopNode {
        &mut self.iop
    }

    pub fn into_iop(self) -> IopNode {
        self.iop
    }

    /// Evaluate the positional subtree and cache collection statistics
    pub fn initialize(&mut self, store: &dyn IndexStore) -> Result<()> {
        self.iop.evaluate(store)?;

        let field = self.iop.field;
        let list = self.iop.list();
        self.stats = LeafStats {
            df: list.df,
            ctf: list.ctf,
            corpus_len: store.total_field_length(field) as f64,
            doc_count: store.doc_count() as f64,
            avg_doc_len: store.avg_field_length(field),
        };
        Ok(())
    }

    pub fn has_doc_match(&self) -> bool {
        self.iop.has_doc_match()
    }

    pub fn current_doc(&self) -> DocId {
        self.iop.current_doc()
    }

    pub fn advance_doc_past(&mut self, doc: DocId) {
        self.iop.advance_doc_past(doc);
    }

    /// Score the current match
    ///
    /// Only valid when `has_doc_match` is true.
    pub fn score(&self, store: &dyn IndexStore, model: &RetrievalModel) -> Result<f64> {
        let posting = self.iop.current_posting();
        let score = match model {
            RetrievalModel::UnrankedBoolean => 1.0,
            RetrievalModel::RankedBoolean => posting.tf as f64,
            RetrievalModel::Bm25 { .. } => {
                let doc_len = store.field_length(self.iop.field, posting.doc)? as f64;
                model.bm25_term_score(
                    posting.tf,
                    self.stats.df,
                    doc_len,
                    self.stats.avg_doc_len,
                    self.stats.doc_count,
                )
            }
            RetrievalModel::Indri { .. } => {
                let doc_len = store.field_length(self.iop.field, posting.doc)? as f64;
                model.indri_term_score(posting.tf, self.stats.ctf, doc_len, self.stats.corpus_len)
            }
        };
        Ok(score)
    }

    /// Score an arbitrary candidate document the wrapped pattern is absent
    /// from, using collection statistics alone
    pub fn default_score(
        &self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
        doc: DocId,
    ) -> Result<f64> {
        let score = match model {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => 0.0,
            RetrievalModel::Bm25 { .. } => 0.0,
            RetrievalModel::Indri { .. } => {
                let doc_len = store.field_length(self.iop.field, doc)? as f64;
                model.indri_default_score(self.stats.ctf, doc_len, self.stats.corpus_len)
            }
        };
        Ok(score)
    }
}
