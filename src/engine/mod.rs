//! Query evaluation driver and result lists

mod executor;
mod results;

pub use executor::QueryEngine;
pub use results::{ScoreEntry, ScoreList};
