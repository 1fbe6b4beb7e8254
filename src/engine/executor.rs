//! Document-at-a-time evaluation driver

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::engine::results::ScoreList;
use crate::error::Result;
use crate::index::IndexStore;
use crate::query::{optimize, QueryParser};
use crate::tokenizer::Tokenizer;

/// Query evaluation engine
///
/// Holds the index store, the retrieval model and the tokenizer; each call
/// to `evaluate` builds a fresh query tree, so evaluations are independent
/// and the engine can be shared across threads.
pub struct QueryEngine {
    store: Arc<dyn IndexStore>,
    config: SearchConfig,
    tokenizer: Tokenizer,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn IndexStore>, config: SearchConfig) -> Self {
        let tokenizer = Tokenizer::new(&config.tokenizer);
        Self {
            store,
            config,
            tokenizer,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Evaluate a query and return its ranked result list
    pub fn evaluate(&self, query: &str) -> Result<ScoreList> {
        let model = self.config.model;
        let parser = QueryParser::new(&self.tokenizer, model);
        let tree = parser.parse(query)?;

        let Some(mut root) = optimize(tree) else {
            debug!(query, "query is empty after optimization");
            return Ok(ScoreList::new());
        };

        root.initialize(self.store.as_ref(), &model)?;

        let mut results = ScoreList::new();
        while root.has_match(self.store.as_ref(), &model)? {
            let Some(doc) = root.matched_doc() else {
                break;
            };
            let score = root.score(self.store.as_ref(), &model)?;
            results.push(doc, score);
            root.advance_past(doc);
        }

        results.sort();
        if let Some(max) = self.config.max_results {
            results.truncate(max);
        }

        info!(
            query,
            model = model.name(),
            hits = results.len(),
            "evaluated query"
        );
        Ok(results)
    }

    /// Evaluate a query, keeping only the `n` best results
    pub fn evaluate_top(&self, query: &str, n: usize) -> Result<ScoreList> {
        let mut results = self.evaluate(query)?;
        results.truncate(n);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::index::{Field, MemoryIndex};
    use crate::model::RetrievalModel;

    fn engine(model: RetrievalModel) -> QueryEngine {
        let tokenizer = TokenizerConfig {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 50,
        };
        let mut index = MemoryIndex::new(&tokenizer);
        index.add_body("d0", "apple pie recipe");
        index.add_body("d1", "apple tart");
        index.add_body("d2", "pear pie");

        let config = SearchConfig {
            model,
            tokenizer,
            max_results: Some(100),
        };
        QueryEngine::new(Arc::new(index), config)
    }

    #[test]
    fn test_boolean_or_matches_union() {
        let engine = engine(RetrievalModel::UnrankedBoolean);
        let results = engine.evaluate("apple pie").unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|e| e.score == 1.0));
    }

    #[test]
    fn test_degenerate_query_yields_empty_list() {
        let engine = engine(RetrievalModel::UnrankedBoolean);
        // synonym of nothing prunes the whole tree
        let results = engine.evaluate("#syn()").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_top_n_truncation() {
        let engine = engine(RetrievalModel::RankedBoolean);
        let results = engine.evaluate_top("apple pie pear", 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_error_does_not_poison_engine() {
        let engine = engine(RetrievalModel::UnrankedBoolean);
        assert!(engine.evaluate("#and(apple").is_err());
        assert!(engine.evaluate("apple").is_ok());
    }

    #[test]
    fn test_field_scoped_query() {
        let tokenizer = TokenizerConfig {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 50,
        };
        let mut index = MemoryIndex::new(&tokenizer);
        index.add_document("d0", &[(Field::Body, "apple"), (Field::Title, "pear")]);
        index.add_document("d1", &[(Field::Body, "pear")]);

        let config = SearchConfig {
            model: RetrievalModel::UnrankedBoolean,
            tokenizer,
            max_results: None,
        };
        let engine = QueryEngine::new(Arc::new(index), config);

        let results = engine.evaluate("pear.title").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.entries()[0].doc, 0);
    }
}
