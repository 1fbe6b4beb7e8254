use serde::{Deserialize, Serialize};

use crate::model::RetrievalModel;

/// Tokenizer configuration
///
/// Query-side lexical processing must match whatever produced the index,
/// so the same configuration value should be used for both.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 1,
            max_token_length: 50,
        }
    }
}

/// Search engine configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Retrieval model used for matching and scoring
    pub model: RetrievalModel,
    /// Lexical processing applied to query terms
    pub tokenizer: TokenizerConfig,
    /// Maximum number of results returned per query (None = unlimited)
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            model: RetrievalModel::default(),
            tokenizer: TokenizerConfig::default(),
            max_results: Some(100),
        }
    }
}

impl SearchConfig {
    /// Create a configuration for the given retrieval model with defaults
    pub fn with_model(model: RetrievalModel) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }
}
