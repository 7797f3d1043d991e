//! Configuration constants for the live session engine
//!
//! This module contains the limits and fixed parameters used throughout
//! the engine: session code shape, scoring bonus, and content bounds
//! enforced on quiz input.

/// Session code configuration constants
pub mod code {
    /// Number of characters in a session code
    pub const LENGTH: usize = 6;
    /// Characters a session code may be composed of
    pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
}

/// Scoring configuration constants
pub mod scoring {
    /// Maximum bonus points awarded for answering instantly
    pub const MAX_TIME_BONUS: u64 = 5;
}

/// Quiz content configuration constants
pub mod quiz {
    /// Maximum length of a quiz title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum length of a quiz description in characters
    pub const MAX_DESCRIPTION_LENGTH: usize = 500;
    /// Maximum number of questions allowed in a single quiz
    pub const MAX_QUESTION_COUNT: usize = 100;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_TEXT_LENGTH: usize = 250;
    /// Maximum number of answer options for a question
    pub const MAX_ANSWER_COUNT: usize = 8;
    /// Maximum length of an answer text in characters
    pub const MAX_ANSWER_TEXT_LENGTH: usize = 200;
    /// Maximum length of an answer label in characters
    pub const MAX_LABEL_LENGTH: usize = 8;
    /// Maximum length of a media url in characters
    pub const MAX_MEDIA_URL_LENGTH: usize = 500;
    /// Minimum per-question time limit in seconds
    pub const MIN_TIME_LIMIT: u64 = 1;
    /// Maximum per-question time limit in seconds
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Default time per question in seconds when a quiz does not set one
    pub const DEFAULT_TIME_PER_QUESTION: u64 = 30;
}

/// Session and participant configuration constants
pub mod session {
    /// Maximum number of participants allowed in a single session
    pub const MAX_PARTICIPANT_COUNT: usize = 1000;
    /// Maximum length of a participant first or last name in characters
    pub const MAX_NAME_LENGTH: usize = 50;
}
