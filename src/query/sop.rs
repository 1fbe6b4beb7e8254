//! Score-level query operators
//!
//! The score layer sits above the positional layer. Its leaves are score
//! adapters; its internal nodes combine child matches and scores according
//! to the active retrieval model. Each node caches its matched document
//! after a successful match test, and the cache is cleared by any cursor
//! movement.
//!
//! Match policy is either "all children at the same document" (boolean and
//! BM25 And) or "smallest document any child points at" (everything else,
//! including Indri And, which scores non-matching children with their
//! default scores instead of excluding the document).

use crate::error::{QuerentError, Result};
use crate::index::{DocId, IndexStore};
use crate::model::RetrievalModel;
use crate::query::score::ScoreAdapter;

/// Kind of score-level operator
#[derive(Clone, Debug)]
pub enum SopKind {
    Score(Box<ScoreAdapter>),
    And,
    Or,
    Sum,
    WeightedAnd,
    WeightedSum,
}

impl SopKind {
    pub fn op_name(&self) -> &'static str {
        match self {
            SopKind::Score(_) => "#score",
            SopKind::And => "#and",
            SopKind::Or => "#or",
            SopKind::Sum => "#sum",
            SopKind::WeightedAnd => "#wand",
            SopKind::WeightedSum => "#wsum",
        }
    }
}

/// A node in the score layer of the query tree
#[derive(Clone, Debug)]
pub struct SopNode {
    pub kind: SopKind,
    pub children: Vec<SopNode>,
    /// Weight attached by an enclosing weighted operator
    pub weight: Option<f64>,
    /// Original query text for this subtree, used in error messages
    pub display: String,
    matched: Option<DocId>,
}

impl SopNode {
    pub fn new(kind: SopKind, children: Vec<SopNode>, display: String) -> Self {
        Self {
            kind,
            children,
            weight: None,
            display,
            matched: None,
        }
    }

    /// Wrap a score adapter, taking over any weight carried by its
    /// positional subtree
    pub fn score_leaf(mut adapter: ScoreAdapter) -> Self {
        let weight = adapter.iop().weight;
        adapter.iop_mut().weight = None;
        let display = adapter.display().to_string();
        Self {
            kind: SopKind::Score(Box::new(adapter)),
            children: Vec::new(),
            weight,
            display,
            matched: None,
        }
    }

    /// Validate the tree against the model and evaluate positional subtrees
    pub fn initialize(&mut self, store: &dyn IndexStore, model: &RetrievalModel) -> Result<()> {
        match &self.kind {
            SopKind::Sum => {
                if !matches!(model, RetrievalModel::Bm25 { .. }) {
                    return Err(self.unsupported(model));
                }
            }
            SopKind::WeightedAnd | SopKind::WeightedSum => {
                if !matches!(model, RetrievalModel::Indri { .. }) {
                    return Err(self.unsupported(model));
                }
                self.total_weight()?;
            }
            _ => {}
        }

        if let SopKind::Score(adapter) = &mut self.kind {
            adapter.initialize(store)?;
        }
        for child in &mut self.children {
            child.initialize(store, model)?;
        }
        self.matched = None;
        Ok(())
    }

    fn unsupported(&self, model: &RetrievalModel) -> QuerentError {
        QuerentError::UnsupportedOperator {
            op: self.kind.op_name().to_string(),
            model: model.name(),
        }
    }

    /// Sum of explicit child weights, rejecting missing and degenerate ones
    fn total_weight(&self) -> Result<f64> {
        let mut total = 0.0;
        for child in &self.children {
            let w = child.weight.ok_or_else(|| {
                QuerentError::InvalidQuery(format!(
                    "{} requires a weight before every argument ({})",
                    self.kind.op_name(),
                    child.display
                ))
            })?;
            if w < 0.0 {
                return Err(QuerentError::InvalidQuery(format!(
                    "negative weight {w} on {}",
                    child.display
                )));
            }
            total += w;
        }
        if total <= 0.0 {
            return Err(QuerentError::InvalidQuery(format!(
                "{} has zero total weight",
                self.kind.op_name()
            )));
        }
        Ok(total)
    }

    fn is_match_all(&self, model: &RetrievalModel) -> bool {
        matches!(self.kind, SopKind::And) && !matches!(model, RetrievalModel::Indri { .. })
    }

    /// Synchronize the subtree and report whether a matching document exists
    ///
    /// On success the match is cached and readable via `matched_doc` until
    /// the next cursor movement.
    pub fn has_match(&mut self, store: &dyn IndexStore, model: &RetrievalModel) -> Result<bool> {
        let doc = if let SopKind::Score(adapter) = &mut self.kind {
            if adapter.has_doc_match() {
                Some(adapter.current_doc())
            } else {
                None
            }
        } else if self.is_match_all(model) {
            self.match_all(store, model)?
        } else {
            self.match_min(store, model)?
        };
        self.matched = doc;
        Ok(doc.is_some())
    }

    /// The document cached by the last successful `has_match`
    pub fn matched_doc(&self) -> Option<DocId> {
        self.matched
    }

    /// All children at the same document; any exhausted child ends matching
    fn match_all(
        &mut self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
    ) -> Result<Option<DocId>> {
        loop {
            let mut target: Option<DocId> = None;
            for child in &mut self.children {
                if !child.has_match(store, model)? {
                    return Ok(None);
                }
                let Some(d) = child.matched else {
                    return Ok(None);
                };
                target = Some(target.map_or(d, |t: DocId| t.max(d)));
            }
            let Some(target) = target else {
                return Ok(None);
            };

            let mut aligned = true;
            for child in &mut self.children {
                if child.matched != Some(target) {
                    aligned = false;
                    child.advance_to(store, model, target)?;
                }
            }
            if aligned {
                return Ok(Some(target));
            }
        }
    }

    /// Smallest document any child currently points at
    fn match_min(
        &mut self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
    ) -> Result<Option<DocId>> {
        let mut min: Option<DocId> = None;
        for child in &mut self.children {
            if child.has_match(store, model)? {
                if let Some(d) = child.matched {
                    min = Some(min.map_or(d, |m: DocId| m.min(d)));
                }
            }
        }
        Ok(min)
    }

    /// Move the subtree's cursors past every document with id <= `doc`
    pub fn advance_past(&mut self, doc: DocId) {
        self.matched = None;
        if let SopKind::Score(adapter) = &mut self.kind {
            adapter.advance_doc_past(doc);
        } else {
            for child in &mut self.children {
                child.advance_past(doc);
            }
        }
    }

    /// Move the subtree to the first match with id >= `doc`
    fn advance_to(
        &mut self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
        doc: DocId,
    ) -> Result<()> {
        while self.has_match(store, model)? {
            match self.matched {
                Some(d) if d < doc => self.advance_past(d),
                _ => break,
            }
        }
        Ok(())
    }

    /// Score the cached match; 0.0 when nothing is matched
    pub fn score(&self, store: &dyn IndexStore, model: &RetrievalModel) -> Result<f64> {
        let Some(doc) = self.matched else {
            return Ok(0.0);
        };

        match &self.kind {
            SopKind::Score(adapter) => adapter.score(store, model),
            SopKind::And => match model {
                RetrievalModel::UnrankedBoolean => Ok(1.0),
                RetrievalModel::RankedBoolean | RetrievalModel::Bm25 { .. } => {
                    let mut min = f64::INFINITY;
                    for child in &self.children {
                        min = min.min(child.score(store, model)?);
                    }
                    Ok(if min.is_finite() { min } else { 0.0 })
                }
                RetrievalModel::Indri { .. } => {
                    let exponent = 1.0 / self.children.len() as f64;
                    let mut product = 1.0;
                    for child in &self.children {
                        let s = child.score_or_default(store, model, doc)?;
                        product *= s.powf(exponent);
                    }
                    Ok(product)
                }
            },
            SopKind::Or => {
                if matches!(model, RetrievalModel::UnrankedBoolean) {
                    return Ok(1.0);
                }
                let mut max = 0.0f64;
                for child in &self.children {
                    if child.matched == Some(doc) {
                        max = max.max(child.score(store, model)?);
                    }
                }
                Ok(max)
            }
            SopKind::Sum => {
                let mut sum = 0.0;
                for child in &self.children {
                    if child.matched == Some(doc) {
                        sum += child.score(store, model)?;
                    }
                }
                Ok(sum)
            }
            SopKind::WeightedAnd => {
                let total = self.total_weight()?;
                let mut product = 1.0;
                for child in &self.children {
                    let w = child.weight.unwrap_or(0.0);
                    let s = child.score_or_default(store, model, doc)?;
                    product *= s.powf(w / total);
                }
                Ok(product)
            }
            SopKind::WeightedSum => {
                let total = self.total_weight()?;
                let mut sum = 0.0;
                for child in &self.children {
                    let w = child.weight.unwrap_or(0.0);
                    sum += child.score_or_default(store, model, doc)? * w;
                }
                Ok(sum / total)
            }
        }
    }

    /// Child's real score if it matches `doc`, otherwise its default score
    fn score_or_default(
        &self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
        doc: DocId,
    ) -> Result<f64> {
        if self.matched == Some(doc) {
            self.score(store, model)
        } else {
            self.default_score(store, model, doc)
        }
    }

    /// Score for a document this subtree does not match
    ///
    /// Required by the Indri combination operators for any candidate
    /// document. Or and Sum have no meaningful default and reject the
    /// request.
    pub fn default_score(
        &self,
        store: &dyn IndexStore,
        model: &RetrievalModel,
        doc: DocId,
    ) -> Result<f64> {
        match &self.kind {
            SopKind::Score(adapter) => adapter.default_score(store, model, doc),
            SopKind::And => {
                let exponent = 1.0 / self.children.len() as f64;
                let mut product = 1.0;
                for child in &self.children {
                    product *= child.default_score(store, model, doc)?.powf(exponent);
                }
                Ok(product)
            }
            SopKind::Or | SopKind::Sum => Err(QuerentError::NoDefaultScore {
                op: self.kind.op_name().to_string(),
            }),
            SopKind::WeightedAnd => {
                let total = self.total_weight()?;
                let mut product = 1.0;
                for child in &self.children {
                    let w = child.weight.unwrap_or(0.0);
                    product *= child.default_score(store, model, doc)?.powf(w / total);
                }
                Ok(product)
            }
            SopKind::WeightedSum => {
                let total = self.total_weight()?;
                let mut sum = 0.0;
                for child in &self.children {
                    let w = child.weight.unwrap_or(0.0);
                    sum += child.default_score(store, model, doc)? * w;
                }
                Ok(sum / total)
            }
        }
    }
}
