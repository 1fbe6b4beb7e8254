//! Lexical processing for documents and queries

mod tokenizer;

pub use tokenizer::Tokenizer;
