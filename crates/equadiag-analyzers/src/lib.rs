//! equadiag-analyzers — Solution analyzers and question sources.
//!
//! Implements the `SolutionAnalyzer` trait for the local heuristic engine,
//! the remote analysis service and OpenAI-compatible chat backends, plus the
//! remote question generator.

pub mod chat;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod questions;
pub mod remote;

pub use config::{
    create_analyzer, create_question_source, load_config, load_config_from, AnalyzerConfig,
    EquadiagConfig,
};
pub use error::ServiceError;
