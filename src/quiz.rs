//! Quiz content model
//!
//! This module defines the read-only content a session runs through: a quiz
//! with its ordered questions and their answer options. Content is owned by
//! an external store (see [`crate::store`]); the engine only validates it on
//! the way in and renders participant-facing views with correctness flags
//! stripped.

use std::{fmt::Display, str::FromStr, time::Duration};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay, skip_serializing_none};
use uuid::Uuid;

/// A unique identifier for a quiz
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuizId(Uuid);

/// A unique identifier for a question within a quiz
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuestionId(Uuid);

/// A unique identifier for an answer option within a question
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct AnswerId(Uuid);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::from_str(s)?))
            }
        }
    };
}

impl_id!(QuizId);
impl_id!(QuestionId);
impl_id!(AnswerId);

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified second bounds.
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the bounds.
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates that at least one answer option is flagged correct.
///
/// Nothing requires *exactly* one correct answer; scoring only looks at the
/// flag of the chosen option.
fn validate_has_correct(answers: &[Answer], _ctx: &()) -> ValidationResult {
    if answers.iter().any(|a| a.correct) {
        Ok(())
    } else {
        Err(garde::Error::new("question has no correct answer"))
    }
}

/// A complete quiz: the ordered sequence of questions a session presents
///
/// Immutable for the lifetime of a session. The shuffle flags affect how
/// the session presents the content, never the content itself.
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Quiz {
    /// Identifier of this quiz in the content store
    #[garde(skip)]
    pub id: QuizId,
    /// Title shown to the presenter
    #[garde(length(max = crate::constants::quiz::MAX_TITLE_LENGTH))]
    pub title: String,
    /// Optional free-form description
    #[garde(inner(length(max = crate::constants::quiz::MAX_DESCRIPTION_LENGTH)))]
    pub description: Option<String>,
    /// Default answering time for questions without their own limit
    #[garde(custom(validate_duration::<{ crate::constants::quiz::MIN_TIME_LIMIT }, { crate::constants::quiz::MAX_TIME_LIMIT }>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_time_per_question")]
    pub time_per_question: Duration,
    /// Whether the question order is shuffled once when the first question is shown
    #[garde(skip)]
    #[serde(default)]
    pub shuffle_questions: bool,
    /// Whether answer options are reshuffled on every question display
    #[garde(skip)]
    #[serde(default)]
    pub shuffle_answers: bool,
    /// The ordered questions of this quiz
    #[garde(length(max = crate::constants::quiz::MAX_QUESTION_COUNT), dive)]
    pub questions: Vec<Question>,
}

fn default_time_per_question() -> Duration {
    Duration::from_secs(crate::constants::quiz::DEFAULT_TIME_PER_QUESTION)
}

/// A single question with its answer options
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier of this question in the content store
    #[garde(skip)]
    pub id: QuestionId,
    /// The question text displayed to everyone
    #[garde(length(max = crate::constants::quiz::MAX_QUESTION_TEXT_LENGTH))]
    pub text: String,
    /// Points awarded for a correct answer before the time bonus
    #[garde(skip)]
    #[serde(default = "default_points")]
    pub points: u64,
    /// Answering time for this question, overriding the quiz default when set
    #[garde(inner(custom(validate_duration::<{ crate::constants::quiz::MIN_TIME_LIMIT }, { crate::constants::quiz::MAX_TIME_LIMIT }>)))]
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    #[serde(default)]
    pub time_limit: Option<Duration>,
    /// Optional media shown alongside the question
    #[garde(inner(length(max = crate::constants::quiz::MAX_MEDIA_URL_LENGTH)))]
    #[serde(default)]
    pub media_url: Option<String>,
    /// The ordered answer options
    #[garde(
        length(min = 1, max = crate::constants::quiz::MAX_ANSWER_COUNT),
        custom(validate_has_correct),
        dive
    )]
    pub answers: Vec<Answer>,
}

fn default_points() -> u64 {
    1
}

/// One answer option of a question
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Answer {
    /// Identifier of this answer in the content store
    #[garde(skip)]
    pub id: AnswerId,
    /// Short label such as "A", "B", "C"
    #[garde(length(max = crate::constants::quiz::MAX_LABEL_LENGTH))]
    pub label: String,
    /// The answer text
    #[garde(length(max = crate::constants::quiz::MAX_ANSWER_TEXT_LENGTH))]
    pub text: String,
    /// Whether choosing this option counts as correct
    #[garde(skip)]
    #[serde(default)]
    pub correct: bool,
}

impl Question {
    /// Returns this question's answering time, falling back to the quiz default
    pub fn effective_time_limit(&self, quiz_default: Duration) -> Duration {
        self.time_limit.unwrap_or(quiz_default)
    }

    /// Returns the first answer option flagged correct, if any
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.correct)
    }

    /// Renders this question for participant devices
    ///
    /// Correctness flags are never included. When `shuffle_answers` is set
    /// the option order is reshuffled independently on every call.
    pub fn display(&self, quiz_default: Duration, shuffle_answers: bool) -> QuestionDisplay {
        let mut answers = self
            .answers
            .iter()
            .map(|a| AnswerDisplay {
                id: a.id,
                label: a.label.clone(),
                text: a.text.clone(),
                is_correct: None,
            })
            .collect_vec();

        if shuffle_answers {
            fastrand::shuffle(&mut answers);
        }

        QuestionDisplay {
            id: self.id,
            text: self.text.clone(),
            time_limit: self.effective_time_limit(quiz_default),
            media_url: self.media_url.clone(),
            answers,
        }
    }
}

impl Quiz {
    /// Returns the number of questions in this quiz
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks whether this quiz contains any questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Looks up a question of this quiz by identifier
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// A question as shown on participant devices
///
/// Carries everything a participant needs to answer and nothing that would
/// give the answer away.
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDisplay {
    /// Identifier of the displayed question
    pub id: QuestionId,
    /// The question text
    pub text: String,
    /// Effective answering time for this question
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub time_limit: Duration,
    /// Optional media shown alongside the question
    pub media_url: Option<String>,
    /// Answer options, correctness stripped
    pub answers: Vec<AnswerDisplay>,
}

/// An answer option as sent over the wire
///
/// The correctness flag stays `None` on participant displays and is filled
/// in only when a question's results are revealed.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDisplay {
    /// Identifier of the answer option
    pub id: AnswerId,
    /// Short label such as "A", "B", "C"
    pub label: String,
    /// The answer text
    pub text: String,
    /// Correctness flag, present only in reveal payloads
    pub is_correct: Option<bool>,
}

impl AnswerDisplay {
    /// Renders an answer option with its correctness revealed
    pub fn revealed(answer: &Answer) -> Self {
        Self {
            id: answer.id,
            label: answer.label.clone(),
            text: answer.text.clone(),
            is_correct: Some(answer.correct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(label: &str, correct: bool) -> Answer {
        Answer {
            id: AnswerId::new(),
            label: label.to_owned(),
            text: format!("answer {label}"),
            correct,
        }
    }

    fn question() -> Question {
        Question {
            id: QuestionId::new(),
            text: "What is the answer?".to_owned(),
            points: 10,
            time_limit: None,
            media_url: None,
            answers: vec![answer("A", true), answer("B", false), answer("C", false)],
        }
    }

    fn quiz() -> Quiz {
        Quiz {
            id: QuizId::new(),
            title: "Trivia".to_owned(),
            description: None,
            time_per_question: Duration::from_secs(30),
            shuffle_questions: false,
            shuffle_answers: false,
            questions: vec![question()],
        }
    }

    #[test]
    fn test_effective_time_limit_falls_back_to_quiz_default() {
        let q = question();
        assert_eq!(
            q.effective_time_limit(Duration::from_secs(30)),
            Duration::from_secs(30)
        );

        let q = Question {
            time_limit: Some(Duration::from_secs(10)),
            ..question()
        };
        assert_eq!(
            q.effective_time_limit(Duration::from_secs(30)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_display_strips_correctness() {
        let q = question();
        let display = q.display(Duration::from_secs(30), false);

        assert_eq!(display.answers.len(), 3);
        assert!(display.answers.iter().all(|a| a.is_correct.is_none()));

        let json = serde_json::to_string(&display).unwrap();
        assert!(!json.contains("isCorrect"));
        assert!(!json.contains("correct"));
    }

    #[test]
    fn test_display_keeps_order_without_shuffle() {
        let q = question();
        let display = q.display(Duration::from_secs(30), false);
        let labels = display.answers.iter().map(|a| &a.label).collect::<Vec<_>>();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn test_display_shuffle_preserves_option_set() {
        let q = question();
        let display = q.display(Duration::from_secs(30), true);
        let mut labels = display
            .answers
            .iter()
            .map(|a| a.label.clone())
            .collect::<Vec<_>>();
        labels.sort();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn test_quiz_validation_accepts_well_formed_content() {
        assert!(quiz().validate().is_ok());
    }

    #[test]
    fn test_quiz_validation_rejects_question_without_correct_answer() {
        let mut quiz = quiz();
        for a in &mut quiz.questions[0].answers {
            a.correct = false;
        }
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_quiz_validation_rejects_question_without_answers() {
        let mut quiz = quiz();
        quiz.questions[0].answers.clear();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_quiz_validation_rejects_zero_time_limit() {
        let mut quiz = quiz();
        quiz.questions[0].time_limit = Some(Duration::ZERO);
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_revealed_answer_carries_correctness() {
        let a = answer("A", true);
        let revealed = AnswerDisplay::revealed(&a);
        assert_eq!(revealed.is_correct, Some(true));

        let json = serde_json::to_string(&revealed).unwrap();
        assert!(json.contains("\"isCorrect\":true"));
    }

    #[test]
    fn test_question_lookup_by_id() {
        let quiz = quiz();
        let id = quiz.questions[0].id;
        assert!(quiz.question(id).is_some());
        assert!(quiz.question(QuestionId::new()).is_none());
    }
}
