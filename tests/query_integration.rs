//! Integration tests for query parsing, optimization and boolean matching
//!
//! Exercises end-to-end evaluation from query text to ranked results over a
//! small in-memory corpus.

use std::sync::Arc;

use querent::{
    DocId, Field, MemoryIndex, QuerentError, QueryEngine, RetrievalModel, SearchConfig,
    TokenizerConfig,
};

fn plain_tokenizer() -> TokenizerConfig {
    TokenizerConfig {
        lowercase: true,
        remove_stopwords: false,
        stem: false,
        min_token_length: 1,
        max_token_length: 50,
    }
}

fn setup_corpus() -> MemoryIndex {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut index = MemoryIndex::new(&plain_tokenizer());
    index.add_body("d0", "rust programming language systems");
    index.add_body("d1", "python programming scripting language");
    index.add_body("d2", "rust systems programming performance");
    index.add_body("d3", "javascript web programming frontend");
    index.add_body("d4", "rust cargo package manager");
    index
}

fn engine_over(index: MemoryIndex, model: RetrievalModel) -> QueryEngine {
    let config = SearchConfig {
        model,
        tokenizer: plain_tokenizer(),
        max_results: None,
    };
    QueryEngine::new(Arc::new(index), config)
}

fn doc_ids(engine: &QueryEngine, query: &str) -> Vec<DocId> {
    let mut docs: Vec<DocId> = engine
        .evaluate(query)
        .unwrap()
        .iter()
        .map(|e| e.doc)
        .collect();
    docs.sort_unstable();
    docs
}

#[test]
fn test_term_query() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "rust"), vec![0, 2, 4]);
}

#[test]
fn test_and_intersects() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "#and(rust programming)"), vec![0, 2]);
    assert_eq!(doc_ids(&engine, "#and(rust python)"), Vec::<DocId>::new());
}

#[test]
fn test_and_over_sparse_doc_sets() {
    // two terms matching {1,3,5} and {1,5,7} must intersect to {1,5}
    let mut index = MemoryIndex::new(&plain_tokenizer());
    for (id, body) in [
        (0, "filler"),
        (1, "alpha beta"),
        (2, "filler"),
        (3, "alpha"),
        (4, "filler"),
        (5, "alpha beta"),
        (6, "filler"),
        (7, "beta"),
    ] {
        index.add_body(&format!("d{id}"), body);
    }

    let engine = engine_over(index, RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "#and(alpha beta)"), vec![1, 5]);
}

#[test]
fn test_or_unions() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "#or(rust python)"), vec![0, 1, 2, 4]);
}

#[test]
fn test_synonym_matches_any_form() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "#syn(python javascript)"), vec![1, 3]);
}

#[test]
fn test_near_requires_order_and_gap() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);

    // adjacent and ordered in d0 only
    assert_eq!(doc_ids(&engine, "#near/1(rust programming)"), vec![0]);
    // wider gap also admits d2 ("rust systems programming")
    assert_eq!(doc_ids(&engine, "#near/2(rust programming)"), vec![0, 2]);
    // reversed order never matches
    assert_eq!(
        doc_ids(&engine, "#near/2(programming rust)"),
        Vec::<DocId>::new()
    );
}

#[test]
fn test_window_is_order_independent() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(
        doc_ids(&engine, "#window/2(programming rust)"),
        vec![0, 2]
    );
}

#[test]
fn test_nested_proximity_inside_boolean() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    assert_eq!(
        doc_ids(&engine, "#or(#near/1(rust programming) cargo)"),
        vec![0, 4]
    );
}

#[test]
fn test_field_qualified_terms() {
    let mut index = MemoryIndex::new(&plain_tokenizer());
    index.add_document(
        "d0",
        &[(Field::Body, "deep learning"), (Field::Title, "neural networks")],
    );
    index.add_document("d1", &[(Field::Body, "neural networks everywhere")]);

    let engine = engine_over(index, RetrievalModel::UnrankedBoolean);
    assert_eq!(doc_ids(&engine, "neural.title"), vec![0]);
    assert_eq!(doc_ids(&engine, "neural"), vec![1]);
}

#[test]
fn test_syntax_errors_are_per_query() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);

    assert!(matches!(
        engine.evaluate("#and(rust").unwrap_err(),
        QuerentError::Syntax(_)
    ));
    assert!(matches!(
        engine.evaluate("rust.author").unwrap_err(),
        QuerentError::UnknownField(_)
    ));
    assert!(matches!(
        engine.evaluate("#near/(rust programming)").unwrap_err(),
        QuerentError::Syntax(_)
    ));

    // a failed query must not affect the next one
    assert_eq!(doc_ids(&engine, "rust"), vec![0, 2, 4]);
}

#[test]
fn test_empty_query_after_optimization() {
    let engine = engine_over(setup_corpus(), RetrievalModel::UnrankedBoolean);
    let results = engine.evaluate("#syn()").unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_stopword_only_query_is_empty() {
    let mut tokenizer = plain_tokenizer();
    tokenizer.remove_stopwords = true;
    let mut index = MemoryIndex::new(&tokenizer);
    index.add_body("d0", "rust programming");

    let config = SearchConfig {
        model: RetrievalModel::UnrankedBoolean,
        tokenizer,
        max_results: None,
    };
    let engine = QueryEngine::new(Arc::new(index), config);

    let results = engine.evaluate("the of and").unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_stemming_aligns_query_and_index() {
    let mut tokenizer = plain_tokenizer();
    tokenizer.stem = true;
    let mut index = MemoryIndex::new(&tokenizer);
    index.add_body("d0", "running shoes");
    index.add_body("d1", "swimming goggles");

    let config = SearchConfig {
        model: RetrievalModel::UnrankedBoolean,
        tokenizer,
        max_results: None,
    };
    let engine = QueryEngine::new(Arc::new(index), config);

    let docs: Vec<DocId> = engine.evaluate("runs").unwrap().iter().map(|e| e.doc).collect();
    assert_eq!(docs, vec![0]);
}
