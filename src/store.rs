//! Content store port
//!
//! The engine never owns quiz content; it fetches it on demand through this
//! trait. Backing it with a database, a cache, or a fixture map is the
//! caller's business.

use thiserror::Error;

use crate::quiz::{AnswerId, QuestionId, Quiz, QuizId};

/// Errors raised when content cannot be resolved
///
/// Question and answer lookups happen inside a fetched quiz, so their
/// variants are raised by the engine rather than by store implementations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No quiz exists under this identifier
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    /// The quiz holds no question under this identifier
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),
    /// The question holds no answer option under this identifier
    #[error("answer {0} not found")]
    AnswerNotFound(AnswerId),
}

/// Read access to quiz content
///
/// Fetches return owned values so the engine never borrows from the store
/// across a session lock.
pub trait ContentStore {
    /// Fetches the quiz under `id`
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuizNotFound`] when no such quiz exists.
    fn quiz(&self, id: QuizId) -> Result<Quiz, Error>;
}
