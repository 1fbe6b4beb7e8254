use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;

/// Text tokenizer with stemming and stopword removal
///
/// The same tokenizer must process both indexed field text and query terms,
/// otherwise a query term can never match its own surface form in the index.
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    fn normalize(&self, word: &str) -> Option<String> {
        let mut token = word.to_string();

        if self.config.lowercase {
            token = token.to_lowercase();
        }

        if token.len() < self.config.min_token_length
            || token.len() > self.config.max_token_length
        {
            return None;
        }

        if self.stopwords.contains(&token) {
            return None;
        }

        if let Some(stemmer) = &self.stemmer {
            token = stemmer.stem(&token).to_string();
        }

        Some(token)
    }

    /// Tokenize a query term
    ///
    /// A single surface term may normalize away entirely (stopword, length
    /// filter) or, in principle, expand; callers must handle both.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalize(word))
            .collect()
    }

    /// Tokenize field text into (term, position) pairs plus the field length
    ///
    /// Positions are 0-indexed over ALL tokens: stopwords and length-filtered
    /// tokens are dropped from the output but still occupy a position and
    /// still count toward the field length, so proximity distances and
    /// document-length statistics see the original token stream.
    pub fn tokenize_field(&self, text: &str) -> (Vec<(String, u32)>, u64) {
        let mut results = Vec::new();
        let mut pos = 0u32;

        for word in text.unicode_words() {
            if let Some(token) = self.normalize(word) {
                results.push((token, pos));
            }
            pos += 1;
        }

        (results, pos as u64)
    }
}
