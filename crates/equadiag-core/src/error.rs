//! Quiz session error types.

use thiserror::Error;

/// Errors returned by [`QuizSession`](crate::session::QuizSession).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The submitted solution was empty or whitespace only.
    #[error("solution for question {0} is empty")]
    EmptySolution(String),

    /// Every question already has an answer.
    #[error("quiz is already complete")]
    AlreadyComplete,

    /// No question in the quiz has this id.
    #[error("unknown question: {0}")]
    UnknownQuestion(String),
}

impl SessionError {
    /// Returns `true` if the learner can fix this by resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::EmptySolution(_))
    }
}
