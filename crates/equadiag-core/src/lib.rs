//! equadiag-core — Answer extraction, grading and remediation for first-degree equation quizzes.
//!
//! This crate defines the data model, the heuristic grading engine, the
//! analyzer traits and the aggregation logic the rest of equadiag builds on.

pub mod catalog;
pub mod error;
pub mod extract;
pub mod grader;
pub mod model;
pub mod remediation;
pub mod report;
pub mod session;
pub mod traits;
