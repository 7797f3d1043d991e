//! Leaderboard ranking
//!
//! This module derives the ordered scoreboard from participant totals. The
//! sort key is cumulative score descending, then cumulative response time
//! for correct answers ascending (faster wins ties), then join order. Rank
//! numbering is governed by a [`TiePolicy`].

use itertools::Itertools;
use serde::Serialize;

use crate::{
    quiz::Quiz,
    roster::{Participant, ParticipantId, Roster},
    session::Session,
};

/// How rank numbers are assigned to exact ties
///
/// Two participants with identical score and response time compare equal
/// under the sort key; the policy decides what numbers they get.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TiePolicy {
    /// Strictly increasing ranks; exact ties are ordered by join order
    ///
    /// The historical behavior of this engine: positions 1, 2, 3, ... with
    /// no shared ranks.
    #[default]
    JoinOrder,
    /// Standard competition ranking: exact ties share a rank, the next
    /// distinct entry skips past them (1, 1, 3, ...)
    Competition,
}

/// One scoreboard entry: a participant and their assigned rank
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedParticipant {
    /// Identifier of the ranked participant
    pub id: ParticipantId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Cumulative score
    pub total_score: u64,
    /// 1-based rank, 0 when not ranked yet (fresh joins)
    pub rank: usize,
    /// Whether the participant currently holds a live connection
    pub is_connected: bool,
}

impl RankedParticipant {
    /// Builds an entry for a participant with an explicit rank
    ///
    /// Rank 0 marks a participant that has not been ranked, such as in the
    /// join announcement.
    pub fn with_rank(participant: &Participant, rank: usize) -> Self {
        Self {
            id: participant.id,
            first_name: participant.first_name.clone(),
            last_name: participant.last_name.clone(),
            total_score: participant.total_score,
            rank,
            is_connected: participant.connected,
        }
    }
}

/// The scoreboard sent to presenters and shown at session end
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    /// Participants in rank order
    pub rankings: Vec<RankedParticipant>,
    /// Number of joined participants
    pub total_participants: usize,
    /// Number of questions in the quiz
    pub total_questions: usize,
    /// Number of questions shown so far
    pub questions_answered: usize,
}

/// Orders participants and assigns rank numbers
///
/// `participants` must be supplied in join order; a stable sort keeps that
/// order as the final tie-break.
pub fn rank<'a, I>(participants: I, policy: TiePolicy) -> Vec<RankedParticipant>
where
    I: IntoIterator<Item = &'a Participant>,
{
    let sorted = participants
        .into_iter()
        .sorted_by_key(|p| (std::cmp::Reverse(p.total_score), p.total_response_time_ms))
        .collect_vec();

    match policy {
        TiePolicy::JoinOrder => sorted
            .into_iter()
            .enumerate()
            .map(|(i, p)| RankedParticipant::with_rank(p, i + 1))
            .collect(),
        TiePolicy::Competition => {
            let mut previous_key = None;
            let mut shared_rank = 0;
            sorted
                .into_iter()
                .enumerate()
                .map(|(i, p)| {
                    let key = (p.total_score, p.total_response_time_ms);
                    if previous_key != Some(key) {
                        previous_key = Some(key);
                        shared_rank = i + 1;
                    }
                    RankedParticipant::with_rank(p, shared_rank)
                })
                .collect()
        }
    }
}

/// Builds the scoreboard for a session
pub fn scoreboard(
    session: &Session,
    quiz: &Quiz,
    roster: &Roster,
    policy: TiePolicy,
) -> Scoreboard {
    Scoreboard {
        rankings: rank(roster.iter(), policy),
        total_participants: roster.len(),
        total_questions: quiz.len(),
        questions_answered: session.questions_answered(),
    }
}
