pub mod config;
pub mod error;
pub mod cache;
pub mod embeddings;
pub mod semantic;
pub mod matching;
pub mod eval;

pub use config::Config;
pub use error::{Result, SseeError};
pub use matching::{evaluate, match_entities, precision, recall, MatchReport, Scores};
pub use semantic::SimilarityProvider;
