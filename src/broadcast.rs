//! Outbound event fan-out
//!
//! This module defines the engine's outbound port: the scoped events a
//! session produces and the [`Broadcast`] trait a transport implements to
//! deliver them. Delivery is fire-and-forget; the engine never waits on a
//! subscriber and never hears back.

use std::fmt::Display;

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    code::SessionCode,
    quiz::{AnswerDisplay, QuestionDisplay, QuestionId},
    ranking::{RankedParticipant, Scoreboard},
    roster::ParticipantId,
    session::Status,
};

/// The audience of one published event
///
/// Three scopes exist per session: the shared room everyone watches, the
/// presenter-only channel, and one private channel per participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Everyone in the session
    Session(SessionCode),
    /// The presenter only
    Admin(SessionCode),
    /// One specific participant
    Participant(SessionCode, ParticipantId),
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(code) => write!(f, "session.{code}"),
            Self::Admin(code) => write!(f, "session.{code}.admin"),
            Self::Participant(code, id) => write!(f, "session.{code}.participant.{id}"),
        }
    }
}

/// An event published to some scope of a session
///
/// Serializes as a tagged object: `{"type": "PARTICIPANT_JOINED", ...}` with
/// camelCase payload fields, which is the shape subscriber clients consume.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Event {
    /// Someone joined; sent to the whole session
    ParticipantJoined {
        /// The new participant, unranked
        participant: RankedParticipant,
        /// Roster size after the join
        participant_count: usize,
    },
    /// The presenter started the session
    SessionStarted {
        /// The status after the transition
        status: Status,
    },
    /// A question went on screen; sent to the whole session
    NewQuestion {
        /// The question, correctness stripped
        question: QuestionDisplay,
        /// Zero-based position within the session's question order
        question_index: usize,
        /// Number of questions in the quiz
        total_questions: usize,
    },
    /// The active question closed and its answer is revealed
    QuestionEnded {
        /// The status after the transition
        status: Status,
        /// The question that just closed, when one was on screen
        question_id: Option<QuestionId>,
        /// The correct option with its flag filled in
        correct_answer: Option<AnswerDisplay>,
    },
    /// The session finished; carries the final scoreboard
    SessionEnded {
        /// Final rankings
        scoreboard: Scoreboard,
    },
    /// Private feedback for one participant's accepted answer
    AnswerResult {
        /// The question that was answered
        question_id: QuestionId,
        /// Whether the chosen option was correct
        is_correct: bool,
        /// Points awarded for this answer
        points_earned: u64,
        /// The participant's cumulative score after this answer
        total_score: u64,
    },
    /// Presenter-only progress count for the active question
    ResponseCount {
        /// The question being answered
        question_id: QuestionId,
        /// Responses recorded so far
        count: usize,
    },
    /// A scoped error notification, such as a rejected duplicate submission
    Error {
        /// Human-readable description
        message: String,
    },
}

impl Event {
    /// Serializes this event to its wire form
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// The transport half of event delivery
///
/// The engine publishes; the implementation routes the event to whatever is
/// subscribed to the scope. Implementations must not block and must not
/// panic back into the engine.
pub trait Broadcast {
    /// Delivers `event` to everything subscribed to `scope`
    fn publish(&self, scope: &ScopeKey, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys_render_hierarchically() {
        let code: SessionCode = "AB12CD".parse().unwrap();
        let id = ParticipantId::new();

        assert_eq!(ScopeKey::Session(code.clone()).to_string(), "session.AB12CD");
        assert_eq!(
            ScopeKey::Admin(code.clone()).to_string(),
            "session.AB12CD.admin"
        );
        assert_eq!(
            ScopeKey::Participant(code, id).to_string(),
            format!("session.AB12CD.participant.{id}")
        );
    }

    #[test]
    fn test_events_serialize_with_screaming_snake_type_tag() {
        let message = Event::SessionStarted {
            status: Status::InProgress,
        }
        .to_message();
        assert_eq!(
            message,
            r#"{"type":"SESSION_STARTED","status":"IN_PROGRESS"}"#
        );
    }

    #[test]
    fn test_event_fields_serialize_in_camel_case() {
        let question_id = QuestionId::new();
        let message = Event::AnswerResult {
            question_id,
            is_correct: true,
            points_earned: 15,
            total_score: 40,
        }
        .to_message();

        assert!(message.contains(r#""type":"ANSWER_RESULT""#));
        assert!(message.contains(r#""questionId""#));
        assert!(message.contains(r#""isCorrect":true"#));
        assert!(message.contains(r#""pointsEarned":15"#));
        assert!(message.contains(r#""totalScore":40"#));
    }

    #[test]
    fn test_question_ended_omits_absent_reveal() {
        let message = Event::QuestionEnded {
            status: Status::ShowingResults,
            question_id: None,
            correct_answer: None,
        }
        .to_message();
        assert_eq!(
            message,
            r#"{"type":"QUESTION_ENDED","status":"SHOWING_RESULTS"}"#
        );
    }
}
