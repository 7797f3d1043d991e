//! Response ledger
//!
//! This module is the idempotency boundary of the engine: the append-only
//! record of who answered what, when, and for how many points. At most one
//! response ever exists per (participant, question) pair; recording one
//! scores it and folds the result into the participant's totals in the same
//! step, so no reader can observe a scored response that is not yet
//! reflected in the totals.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    quiz::{Answer, AnswerId, Question, QuestionId},
    roster::{Participant, ParticipantId},
    scoring,
};

/// Errors that can occur when recording a response
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// This participant has already answered this question
    ///
    /// Routine traffic: double-clicks and retried requests land here.
    #[error("already answered this question")]
    DuplicateSubmission,
    /// The answer could not be scored
    #[error(transparent)]
    Scoring(#[from] scoring::Error),
}

/// The immutable record of one accepted answer submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Who answered
    pub participant_id: ParticipantId,
    /// Which question was answered
    pub question_id: QuestionId,
    /// Which option was chosen
    pub answer_id: AnswerId,
    /// Elapsed time between question display and submission
    pub response_time_ms: u64,
    /// Points awarded, time bonus included
    pub points_earned: u64,
    /// Whether the chosen option was flagged correct
    pub is_correct: bool,
}

/// The per-session store of recorded responses
///
/// Keyed by (participant, question) so the uniqueness invariant is held by
/// the map itself. Entries are never mutated or removed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    responses: HashMap<(ParticipantId, QuestionId), Response>,
}

impl Ledger {
    /// Records a participant's answer, scoring it and updating their totals
    ///
    /// On success the response is stored, the participant's cumulative score
    /// grows by the points earned, and — for correct answers only — their
    /// cumulative response time grows by `response_time_ms`. The duplicate
    /// check, the insert, and the total updates happen as one unit; callers
    /// serialize concurrent submissions with the session lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSubmission`] if this (participant,
    /// question) pair already has a response, or a scoring error for a
    /// malformed time limit. Either way nothing is mutated.
    pub fn record(
        &mut self,
        participant: &mut Participant,
        question: &Question,
        answer: &Answer,
        response_time_ms: u64,
        quiz_default_time_limit: Duration,
    ) -> Result<Response, Error> {
        let entry = match self.responses.entry((participant.id, question.id)) {
            Entry::Occupied(_) => return Err(Error::DuplicateSubmission),
            Entry::Vacant(entry) => entry,
        };

        let points = scoring::score(question, answer, response_time_ms, quiz_default_time_limit)?;

        let response = Response {
            participant_id: participant.id,
            question_id: question.id,
            answer_id: answer.id,
            response_time_ms,
            points_earned: points,
            is_correct: answer.correct,
        };
        entry.insert(response.clone());

        participant.total_score += points;
        if answer.correct {
            participant.total_response_time_ms += response_time_ms;
        }

        Ok(response)
    }

    /// Checks whether a participant has already answered a question
    pub fn has_answered(&self, participant_id: ParticipantId, question_id: QuestionId) -> bool {
        self.responses.contains_key(&(participant_id, question_id))
    }

    /// Counts the responses recorded for a question
    ///
    /// Used for the presenter's progress display while a question is active.
    pub fn response_count_for(&self, question_id: QuestionId) -> usize {
        self.responses
            .keys()
            .filter(|(_, q)| *q == question_id)
            .count()
    }

    /// Returns the total number of recorded responses
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Checks whether any response has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Duration = Duration::from_secs(10);

    fn participant() -> Participant {
        Participant {
            id: ParticipantId::new(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            total_score: 0,
            total_response_time_ms: 0,
            connected: true,
        }
    }

    fn question() -> Question {
        Question {
            id: QuestionId::new(),
            text: "q".to_owned(),
            points: 10,
            time_limit: None,
            media_url: None,
            answers: vec![
                Answer {
                    id: AnswerId::new(),
                    label: "A".to_owned(),
                    text: "right".to_owned(),
                    correct: true,
                },
                Answer {
                    id: AnswerId::new(),
                    label: "B".to_owned(),
                    text: "wrong".to_owned(),
                    correct: false,
                },
            ],
        }
    }

    #[test]
    fn test_correct_answer_updates_score_and_time() {
        let mut ledger = Ledger::default();
        let mut p = participant();
        let q = question();

        let response = ledger
            .record(&mut p, &q, &q.answers[0].clone(), 1_000, DEFAULT)
            .unwrap();

        // 9000/10000 remaining: bonus 5 on top of 10 base points.
        assert_eq!(response.points_earned, 15);
        assert!(response.is_correct);
        assert_eq!(p.total_score, 15);
        assert_eq!(p.total_response_time_ms, 1_000);
    }

    #[test]
    fn test_wrong_answer_does_not_accumulate_response_time() {
        let mut ledger = Ledger::default();
        let mut p = participant();
        let q = question();

        let response = ledger
            .record(&mut p, &q, &q.answers[1].clone(), 1_000, DEFAULT)
            .unwrap();

        assert_eq!(response.points_earned, 0);
        assert!(!response.is_correct);
        assert_eq!(p.total_score, 0);
        assert_eq!(p.total_response_time_ms, 0);
    }

    #[test]
    fn test_second_submission_is_rejected_without_mutation() {
        let mut ledger = Ledger::default();
        let mut p = participant();
        let q = question();

        ledger
            .record(&mut p, &q, &q.answers[1].clone(), 500, DEFAULT)
            .unwrap();
        let err = ledger
            .record(&mut p, &q, &q.answers[0].clone(), 0, DEFAULT)
            .unwrap_err();

        assert_eq!(err, Error::DuplicateSubmission);
        assert_eq!(p.total_score, 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_scoring_failure_leaves_no_trace() {
        let mut ledger = Ledger::default();
        let mut p = participant();
        let mut q = question();
        q.time_limit = Some(Duration::ZERO);

        let err = ledger
            .record(&mut p, &q, &q.answers[0].clone(), 0, DEFAULT)
            .unwrap_err();

        assert_eq!(err, Error::Scoring(scoring::Error::ZeroTimeLimit));
        assert!(ledger.is_empty());
        assert!(!ledger.has_answered(p.id, q.id));
        assert_eq!(p.total_score, 0);
    }

    #[test]
    fn test_queries_track_recorded_responses() {
        let mut ledger = Ledger::default();
        let q = question();
        let other_question = question();

        let mut first = participant();
        let mut second = participant();

        assert!(!ledger.has_answered(first.id, q.id));
        assert_eq!(ledger.response_count_for(q.id), 0);

        ledger
            .record(&mut first, &q, &q.answers[0].clone(), 100, DEFAULT)
            .unwrap();
        ledger
            .record(&mut second, &q, &q.answers[1].clone(), 200, DEFAULT)
            .unwrap();
        ledger
            .record(&mut first, &other_question, &other_question.answers[0].clone(), 300, DEFAULT)
            .unwrap();

        assert!(ledger.has_answered(first.id, q.id));
        assert!(!ledger.has_answered(second.id, other_question.id));
        assert_eq!(ledger.response_count_for(q.id), 2);
        assert_eq!(ledger.response_count_for(other_question.id), 1);
    }

    #[test]
    fn test_totals_accumulate_across_questions() {
        let mut ledger = Ledger::default();
        let mut p = participant();
        let first = question();
        let second = question();

        ledger
            .record(&mut p, &first, &first.answers[0].clone(), 0, DEFAULT)
            .unwrap();
        ledger
            .record(&mut p, &second, &second.answers[0].clone(), 10_000, DEFAULT)
            .unwrap();

        // 15 for the instant answer, 10 for the one at the limit.
        assert_eq!(p.total_score, 25);
        assert_eq!(p.total_response_time_ms, 10_000);
    }
}
