//! Retrieval models and their scoring formulas
//!
//! A retrieval model is an immutable value that selects both the default
//! top-level query operator and the scoring branch every operator takes
//! during evaluation. The numeric formulas live here as pure functions so
//! that operators stay free of ranking math.

use serde::{Deserialize, Serialize};

use crate::error::{QuerentError, Result};

/// Retrieval model selected for a query evaluation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum RetrievalModel {
    /// Boolean matching, every matched document scores 1.0
    UnrankedBoolean,
    /// Boolean matching scored by term frequency
    RankedBoolean,
    /// Okapi BM25 with the usual k1/b/k3 parameters
    Bm25 { k1: f64, b: f64, k3: f64 },
    /// Dirichlet-smoothed unigram language model with Jelinek-Mercer mixing
    Indri { mu: f64, lambda: f64 },
}

impl Default for RetrievalModel {
    fn default() -> Self {
        RetrievalModel::Bm25 {
            k1: 1.2,
            b: 0.75,
            k3: 0.0,
        }
    }
}

impl RetrievalModel {
    /// Create a BM25 model, validating parameter ranges
    pub fn bm25(k1: f64, b: f64, k3: f64) -> Result<Self> {
        if k1 < 0.0 || k3 < 0.0 {
            return Err(QuerentError::InvalidQuery(format!(
                "BM25 k1 and k3 must be non-negative (k1={k1}, k3={k3})"
            )));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(QuerentError::InvalidQuery(format!(
                "BM25 b must be in [0, 1] (b={b})"
            )));
        }
        Ok(RetrievalModel::Bm25 { k1, b, k3 })
    }

    /// Create an Indri model, validating parameter ranges
    pub fn indri(mu: f64, lambda: f64) -> Result<Self> {
        if mu < 0.0 {
            return Err(QuerentError::InvalidQuery(format!(
                "Indri mu must be non-negative (mu={mu})"
            )));
        }
        if !(0.0..=1.0).contains(&lambda) {
            return Err(QuerentError::InvalidQuery(format!(
                "Indri lambda must be in [0, 1] (lambda={lambda})"
            )));
        }
        Ok(RetrievalModel::Indri { mu, lambda })
    }

    /// Short model name used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean => "unranked_boolean",
            RetrievalModel::RankedBoolean => "ranked_boolean",
            RetrievalModel::Bm25 { .. } => "bm25",
            RetrievalModel::Indri { .. } => "indri",
        }
    }

    /// Default operator wrapped around every raw query string
    ///
    /// This lets the rest of the engine assume the root of a parsed query
    /// always produces document ids and scores.
    pub fn default_operator(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => "#or",
            RetrievalModel::Bm25 { .. } => "#sum",
            RetrievalModel::Indri { .. } => "#and",
        }
    }

    /// BM25 score of one term occurrence
    ///
    /// `RSJ weight * tf weight * user weight`, with the RSJ weight floored
    /// at zero and a fixed query term frequency of 1 (repeated query terms
    /// are separate leaves, not weighted further).
    pub fn bm25_term_score(
        &self,
        tf: u32,
        df: u32,
        doc_len: f64,
        avg_doc_len: f64,
        total_docs: f64,
    ) -> f64 {
        let (k1, b, k3) = match self {
            RetrievalModel::Bm25 { k1, b, k3 } => (*k1, *b, *k3),
            _ => return 0.0,
        };
        if avg_doc_len <= 0.0 {
            return 0.0;
        }
        let tf = tf as f64;
        let df = df as f64;
        let qtf = 1.0;

        let rsj = ((total_docs - df + 0.5) / (df + 0.5)).ln().max(0.0);
        let tf_weight = tf / (tf + k1 * ((1.0 - b) + b * doc_len / avg_doc_len));
        let user_weight = (k3 + 1.0) * qtf / (k3 + qtf);

        rsj * tf_weight * user_weight
    }

    /// Indri score of a term that occurs `tf` times in the document
    pub fn indri_term_score(&self, tf: u32, ctf: u64, doc_len: f64, corpus_len: f64) -> f64 {
        let (mu, lambda) = match self {
            RetrievalModel::Indri { mu, lambda } => (*mu, *lambda),
            _ => return 0.0,
        };
        if corpus_len <= 0.0 {
            return 0.0;
        }
        let p_mle = ctf as f64 / corpus_len;
        (1.0 - lambda) * (tf as f64 + mu * p_mle) / (doc_len + mu) + lambda * p_mle
    }

    /// Indri score of a term that is absent from the document (tf = 0)
    ///
    /// Computable for any candidate document from collection statistics
    /// alone, which is what makes default-score substitution possible in
    /// the combination operators.
    pub fn indri_default_score(&self, ctf: u64, doc_len: f64, corpus_len: f64) -> f64 {
        let (mu, lambda) = match self {
            RetrievalModel::Indri { mu, lambda } => (*mu, *lambda),
            _ => return 0.0,
        };
        if corpus_len <= 0.0 {
            return 0.0;
        }
        let p_mle = ctf as f64 / corpus_len;
        (1.0 - lambda) * mu * p_mle / (doc_len + mu) + lambda * p_mle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_operator_per_model() {
        assert_eq!(RetrievalModel::UnrankedBoolean.default_operator(), "#or");
        assert_eq!(RetrievalModel::RankedBoolean.default_operator(), "#or");
        assert_eq!(
            RetrievalModel::bm25(1.2, 0.75, 0.0).unwrap().default_operator(),
            "#sum"
        );
        assert_eq!(
            RetrievalModel::indri(2500.0, 0.4).unwrap().default_operator(),
            "#and"
        );
    }

    #[test]
    fn test_parameter_validation() {
        assert!(RetrievalModel::bm25(-0.1, 0.75, 0.0).is_err());
        assert!(RetrievalModel::bm25(1.2, 1.5, 0.0).is_err());
        assert!(RetrievalModel::indri(-1.0, 0.4).is_err());
        assert!(RetrievalModel::indri(2500.0, 1.2).is_err());
        assert!(RetrievalModel::indri(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_bm25_closed_form() {
        // N=10, df=2, tf=3, docLen=50, avgDocLen=40, k1=1.2, b=0.75, k3=0
        let model = RetrievalModel::bm25(1.2, 0.75, 0.0).unwrap();
        let score = model.bm25_term_score(3, 2, 50.0, 40.0, 10.0);

        let rsj = ((10.0 - 2.0 + 0.5) / (2.0 + 0.5) as f64).ln();
        let tf_weight = 3.0 / (3.0 + 1.2 * ((1.0 - 0.75) + 0.75 * 50.0 / 40.0));
        let expected = rsj * tf_weight; // user weight is 1 when qtf=1
        assert!((score - expected).abs() < EPS);
    }

    #[test]
    fn test_bm25_rsj_floor() {
        // df > N/2 drives the RSJ weight negative; it must clamp to zero
        let model = RetrievalModel::bm25(1.2, 0.75, 0.0).unwrap();
        let score = model.bm25_term_score(3, 9, 50.0, 40.0, 10.0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_indri_default_below_present() {
        let model = RetrievalModel::indri(2500.0, 0.4).unwrap();
        let present = model.indri_term_score(2, 100, 300.0, 1_000_000.0);
        let default = model.indri_default_score(100, 300.0, 1_000_000.0);

        assert!(default > 0.0);
        assert!(default < present);
    }

    #[test]
    fn test_indri_empty_corpus_is_zero() {
        let model = RetrievalModel::indri(2500.0, 0.4).unwrap();
        assert_eq!(model.indri_term_score(2, 0, 300.0, 0.0), 0.0);
        assert_eq!(model.indri_default_score(0, 300.0, 0.0), 0.0);
    }

    #[test]
    fn test_model_serde() {
        let model = RetrievalModel::indri(2500.0, 0.4).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: RetrievalModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
