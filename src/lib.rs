pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod query;
pub mod tokenizer;

pub use config::{SearchConfig, TokenizerConfig};
pub use engine::{QueryEngine, ScoreEntry, ScoreList};
pub use error::{QuerentError, Result};
pub use index::{DocId, Field, IndexStore, InvertedList, MemoryIndex, Posting};
pub use model::RetrievalModel;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
