//! Positional inverted index: core types, the read-only store contract,
//! and an in-memory implementation

mod memory;
mod store;
mod types;

pub use memory::MemoryIndex;
pub use store::IndexStore;
pub use types::{DocId, Field, InvertedList, Posting, PostingCursor};
