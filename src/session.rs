//! Session lifecycle state machine
//!
//! This module owns one live run of a quiz: its status, the single mutable
//! "current question" cursor, and the guards on every transition. Callers
//! never mutate a session except through the transition methods, and a
//! failed transition leaves the session untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    code::SessionCode,
    quiz::{Question, QuestionDisplay, Quiz, QuizId},
};

/// The lifecycle status of a session
///
/// Statuses are only ever visited in the order
/// `Waiting → InProgress → (QuestionActive ⇄ ShowingResults) → Finished`,
/// with `Finished` reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Registration open, nothing shown yet
    Waiting,
    /// Started, between questions
    InProgress,
    /// A question is on screen and accepting answers
    QuestionActive,
    /// Results of the last question are on screen
    ShowingResults,
    /// The session is over; terminal
    Finished,
}

/// Errors raised by rejected transitions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested transition is not legal from the current status
    #[error("operation not allowed while session is {status:?}")]
    InvalidState {
        /// The status the session was in when the transition was attempted
        status: Status,
    },
    /// The requested question index is out of range
    #[error("question index {index} out of range for quiz with {count} questions")]
    InvalidIndex {
        /// The rejected index
        index: usize,
        /// The number of questions in the quiz
        count: usize,
    },
}

/// Presenter-chosen options for one session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Cap on the number of participants, unlimited when `None`
    pub max_participants: Option<usize>,
    /// Whether participants see correctness feedback right after answering
    pub show_immediate_feedback: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_participants: None,
            show_immediate_feedback: true,
        }
    }
}

/// One live run of a quiz
///
/// Mutable state is limited to the status, the question cursor, the
/// question-start timestamp, the registration flag, and the fixed shuffle
/// order. Everything else is set at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    code: SessionCode,
    quiz_id: QuizId,
    status: Status,
    current_question_index: Option<usize>,
    question_started_at: Option<SystemTime>,
    open_registration: bool,
    max_participants: Option<usize>,
    show_immediate_feedback: bool,
    /// Permutation fixed at the first question display of a shuffled quiz
    question_order: Option<Vec<usize>>,
    created_at: SystemTime,
}

impl Session {
    /// Creates a session in the `Waiting` status with open registration
    pub fn new(code: SessionCode, quiz_id: QuizId, options: SessionOptions) -> Self {
        Self {
            code,
            quiz_id,
            status: Status::Waiting,
            current_question_index: None,
            question_started_at: None,
            open_registration: true,
            max_participants: options.max_participants,
            show_immediate_feedback: options.show_immediate_feedback,
            question_order: None,
            created_at: SystemTime::now(),
        }
    }

    /// Returns the session's join code
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Returns the identifier of the quiz this session runs
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// Returns the current lifecycle status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the current question index, `None` before the first question
    pub fn current_question_index(&self) -> Option<usize> {
        self.current_question_index
    }

    /// Returns when the current question was shown
    pub fn question_started_at(&self) -> Option<SystemTime> {
        self.question_started_at
    }

    /// Whether participants may still join
    pub fn registration_open(&self) -> bool {
        self.open_registration
    }

    /// Returns the participant cap, if any
    pub fn max_participants(&self) -> Option<usize> {
        self.max_participants
    }

    /// Whether participants get correctness feedback right after answering
    pub fn show_immediate_feedback(&self) -> bool {
        self.show_immediate_feedback
    }

    /// Returns when the session was created
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Number of questions shown so far
    pub fn questions_answered(&self) -> usize {
        self.current_question_index.map_or(0, |i| i + 1)
    }

    /// Starts the session, closing registration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the session is `Waiting`.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.status != Status::Waiting {
            return Err(Error::InvalidState {
                status: self.status,
            });
        }
        self.status = Status::InProgress;
        self.open_registration = false;
        Ok(())
    }

    /// Shows the question at `index`, rendered for participants
    ///
    /// When the quiz shuffles questions the permutation is drawn once, at
    /// the first display of the session, and reused for every later call;
    /// `index` then addresses the shuffled order. Answer options reshuffle
    /// independently on every call when the quiz asks for it. Sets the
    /// cursor and records the question-start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the session is `InProgress`
    /// or `ShowingResults`, and [`Error::InvalidIndex`] for an out-of-range
    /// index. Neither failure mutates the session.
    pub fn show_question(&mut self, quiz: &Quiz, index: usize) -> Result<QuestionDisplay, Error> {
        if !matches!(self.status, Status::InProgress | Status::ShowingResults) {
            return Err(Error::InvalidState {
                status: self.status,
            });
        }
        if index >= quiz.len() {
            return Err(Error::InvalidIndex {
                index,
                count: quiz.len(),
            });
        }

        if quiz.shuffle_questions && self.question_order.is_none() {
            let mut order = (0..quiz.len()).collect::<Vec<_>>();
            fastrand::shuffle(&mut order);
            self.question_order = Some(order);
        }

        self.current_question_index = Some(index);
        self.question_started_at = Some(SystemTime::now());
        self.status = Status::QuestionActive;

        let question = self
            .resolve_question(quiz, index)
            .expect("index was validated against the quiz");
        Ok(question.display(quiz.time_per_question, quiz.shuffle_answers))
    }

    /// Ends the active question, moving to the results screen
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless a question is active.
    pub fn end_question(&mut self) -> Result<(), Error> {
        if self.status != Status::QuestionActive {
            return Err(Error::InvalidState {
                status: self.status,
            });
        }
        self.status = Status::ShowingResults;
        Ok(())
    }

    /// Finishes the session
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session is already finished.
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.status == Status::Finished {
            return Err(Error::InvalidState {
                status: self.status,
            });
        }
        self.status = Status::Finished;
        Ok(())
    }

    /// Returns the question currently on screen, if any
    ///
    /// Resolves through the fixed shuffle order when one exists.
    pub fn current_question<'q>(&self, quiz: &'q Quiz) -> Option<&'q Question> {
        self.resolve_question(quiz, self.current_question_index?)
    }

    fn resolve_question<'q>(&self, quiz: &'q Quiz, index: usize) -> Option<&'q Question> {
        let actual = match &self.question_order {
            Some(order) => *order.get(index)?,
            None => index,
        };
        quiz.questions.get(actual)
    }
}
