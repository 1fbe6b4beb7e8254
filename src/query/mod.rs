//! Query representation: positional and score-level operator trees,
//! parsing, and tree simplification

pub mod iop;
pub mod optimizer;
pub mod parser;
pub mod score;
pub mod sop;

pub use iop::{IopKind, IopNode};
pub use optimizer::optimize;
pub use parser::QueryParser;
pub use score::ScoreAdapter;
pub use sop::{SopKind, SopNode};
