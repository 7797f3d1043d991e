//! Session orchestration
//!
//! This module wires the engine together: a registry of live sessions keyed
//! by join code, with one lock per session so every command against a
//! session runs alone. Content comes in through [`ContentStore`] and events
//! go out through [`Broadcast`]; events are computed under the session lock
//! but published only after it is released.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use serde::Serialize;
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::{
    broadcast::{Broadcast, Event, ScopeKey},
    code::SessionCode,
    constants::session::MAX_PARTICIPANT_COUNT,
    ledger::{self, Ledger, Response},
    quiz::{AnswerDisplay, AnswerId, Question, QuestionDisplay, QuestionId, QuizId},
    ranking::{self, RankedParticipant, Scoreboard, TiePolicy},
    roster::{self, Participant, ParticipantId, Roster},
    session::{self, Session, SessionOptions, Status},
    store::{self, ContentStore},
};

/// Errors surfaced by orchestrator commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No live session exists under this code
    #[error("session {0} not found")]
    SessionNotFound(SessionCode),
    /// The session has no participant under this identifier
    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),
    /// The session no longer accepts joins
    #[error("registration is closed")]
    RegistrationClosed,
    /// The session reached its participant cap
    #[error("session is full")]
    SessionFull,
    /// The quiz has no questions to run
    #[error("quiz has no questions")]
    EmptyQuiz,
    /// Content could not be resolved
    #[error(transparent)]
    Content(#[from] store::Error),
    /// A lifecycle transition was rejected
    #[error(transparent)]
    Session(#[from] session::Error),
    /// A submission was rejected by the ledger
    #[error(transparent)]
    Ledger(#[from] ledger::Error),
    /// A join was rejected by the roster
    #[error(transparent)]
    Roster(#[from] roster::Error),
}

/// A session's read-only summary for presenter dashboards
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Join code
    pub code: SessionCode,
    /// Current lifecycle status
    pub status: Status,
    /// The quiz this session runs
    pub quiz_id: QuizId,
    /// Title of that quiz
    pub quiz_title: String,
    /// Current question index, absent before the first question
    pub current_question_index: Option<usize>,
    /// Number of questions in the quiz
    pub total_questions: usize,
    /// Number of joined participants
    pub participant_count: usize,
    /// Whether participants may still join
    pub open_registration: bool,
    /// Participant cap, if any
    pub max_participants: Option<usize>,
    /// Whether answer feedback is sent right after each submission
    pub show_immediate_feedback: bool,
}

/// The mutable state of one live session, guarded by a single lock
struct LiveSession {
    session: Session,
    roster: Roster,
    ledger: Ledger,
}

/// The engine's front door: owns every live session
///
/// The registry lock is held only for lookups and insertions; all work
/// against a session happens under that session's own lock, so commands for
/// different sessions never contend.
pub struct Orchestrator {
    sessions: RwLock<HashMap<SessionCode, Arc<Mutex<LiveSession>>>>,
    tie_policy: TiePolicy,
}

fn lock(live: &Mutex<LiveSession>) -> MutexGuard<'_, LiveSession> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(TiePolicy::default())
    }
}

impl Orchestrator {
    /// Creates an orchestrator with no live sessions
    pub fn new(tie_policy: TiePolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            tie_policy,
        }
    }

    fn live(&self, code: &SessionCode) -> Result<Arc<Mutex<LiveSession>>, Error> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(code.clone()))
    }

    /// Creates a new session over an existing quiz and returns its code
    ///
    /// The code is generated and claimed under the registry's write lock, so
    /// two racing creations can never claim the same code.
    ///
    /// # Errors
    ///
    /// Returns a content error when the quiz does not exist, or
    /// [`Error::EmptyQuiz`] when it has no questions to run.
    pub fn create_session<C: ContentStore>(
        &self,
        store: &C,
        quiz_id: QuizId,
        options: SessionOptions,
    ) -> Result<SessionCode, Error> {
        let quiz = store.quiz(quiz_id)?;
        if quiz.is_empty() {
            return Err(Error::EmptyQuiz);
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let code = SessionCode::generate(|c| sessions.contains_key(c));
        sessions.insert(
            code.clone(),
            Arc::new(Mutex::new(LiveSession {
                session: Session::new(code.clone(), quiz_id, options),
                roster: Roster::default(),
                ledger: Ledger::default(),
            })),
        );
        drop(sessions);

        tracing::info!(%code, %quiz_id, "session created");
        Ok(code)
    }

    /// Joins a participant to a waiting session
    ///
    /// Announces the join to the whole session on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code,
    /// [`Error::RegistrationClosed`] once the session has started or
    /// finished, [`Error::SessionFull`] at the participant cap, and a roster
    /// error for a name already taken in this session.
    pub fn join<B: Broadcast>(
        &self,
        broadcast: &B,
        code: &SessionCode,
        first_name: &str,
        last_name: &str,
    ) -> Result<ParticipantId, Error> {
        let live = self.live(code)?;
        let (id, event) = {
            let mut guard = lock(&live);
            if !guard.session.registration_open() || guard.session.status() == Status::Finished {
                tracing::warn!(%code, "join rejected, registration closed");
                return Err(Error::RegistrationClosed);
            }
            // Configured caps are clamped to the engine-wide ceiling; an
            // uncapped session stays uncapped.
            if let Some(cap) = guard.session.max_participants() {
                let cap = cap.min(MAX_PARTICIPANT_COUNT);
                if guard.roster.len() >= cap {
                    tracing::warn!(%code, cap, "join rejected, session full");
                    return Err(Error::SessionFull);
                }
            }

            let (id, announced) = match guard.roster.join(first_name, last_name) {
                Ok(participant) => (participant.id, RankedParticipant::with_rank(participant, 0)),
                Err(err) => {
                    tracing::warn!(%code, %err, "join rejected");
                    return Err(err.into());
                }
            };
            let event = Event::ParticipantJoined {
                participant: announced,
                participant_count: guard.roster.len(),
            };
            (id, event)
        };

        tracing::info!(%code, participant = %id, "participant joined");
        broadcast.publish(&ScopeKey::Session(code.clone()), &event);
        Ok(id)
    }

    /// Starts a session, closing registration
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, or an invalid
    /// state error unless the session is waiting.
    pub fn start<B: Broadcast>(&self, broadcast: &B, code: &SessionCode) -> Result<(), Error> {
        let live = self.live(code)?;
        let event = {
            let mut guard = lock(&live);
            guard.session.start()?;
            Event::SessionStarted {
                status: guard.session.status(),
            }
        };

        tracing::info!(%code, "session started");
        broadcast.publish(&ScopeKey::Session(code.clone()), &event);
        Ok(())
    }

    /// Puts the question at `index` on screen
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, a content
    /// error when the quiz cannot be fetched, or an invalid state or index
    /// error from the session.
    pub fn show_question<C: ContentStore, B: Broadcast>(
        &self,
        store: &C,
        broadcast: &B,
        code: &SessionCode,
        index: usize,
    ) -> Result<QuestionDisplay, Error> {
        let live = self.live(code)?;
        let (display, event) = {
            let mut guard = lock(&live);
            let quiz = store.quiz(guard.session.quiz_id())?;
            let display = guard.session.show_question(&quiz, index)?;
            let event = Event::NewQuestion {
                question: display.clone(),
                question_index: index,
                total_questions: quiz.len(),
            };
            (display, event)
        };

        tracing::info!(%code, index, "question shown");
        broadcast.publish(&ScopeKey::Session(code.clone()), &event);
        Ok(display)
    }

    /// Closes the active question and reveals its correct answer
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, a content
    /// error when the quiz cannot be fetched, or an invalid state error when
    /// no question is active.
    pub fn end_question<C: ContentStore, B: Broadcast>(
        &self,
        store: &C,
        broadcast: &B,
        code: &SessionCode,
    ) -> Result<(), Error> {
        let live = self.live(code)?;
        let event = {
            let mut guard = lock(&live);
            let quiz = store.quiz(guard.session.quiz_id())?;
            guard.session.end_question()?;

            let question = guard.session.current_question(&quiz);
            Event::QuestionEnded {
                status: guard.session.status(),
                question_id: question.map(|q| q.id),
                correct_answer: question
                    .and_then(Question::correct_answer)
                    .map(AnswerDisplay::revealed),
            }
        };

        tracing::info!(%code, "question ended");
        broadcast.publish(&ScopeKey::Session(code.clone()), &event);
        Ok(())
    }

    /// Finishes a session and publishes the final scoreboard
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, a content
    /// error when the quiz cannot be fetched, or an invalid state error when
    /// the session is already finished.
    pub fn finish<C: ContentStore, B: Broadcast>(
        &self,
        store: &C,
        broadcast: &B,
        code: &SessionCode,
    ) -> Result<Scoreboard, Error> {
        let live = self.live(code)?;
        let (scoreboard, event) = {
            let mut guard = lock(&live);
            let quiz = store.quiz(guard.session.quiz_id())?;
            guard.session.finish()?;

            let scoreboard =
                ranking::scoreboard(&guard.session, &quiz, &guard.roster, self.tie_policy);
            let event = Event::SessionEnded {
                scoreboard: scoreboard.clone(),
            };
            (scoreboard, event)
        };

        tracing::info!(%code, "session finished");
        broadcast.publish(&ScopeKey::Session(code.clone()), &event);
        Ok(scoreboard)
    }

    /// Records a participant's answer to a question of the session's quiz
    ///
    /// Arrival time carries no lifecycle guard: an answer landing after the
    /// presenter closed the question is scored and recorded exactly like an
    /// on-time one, with the duplicate check as the only gate. On success
    /// the participant receives private feedback (when the session has
    /// immediate feedback enabled) and the presenter receives the updated
    /// response count. A duplicate submission is rejected and the
    /// participant is notified on their private scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] or [`Error::ParticipantNotFound`]
    /// for unknown identifiers, content errors when the question or answer
    /// is not part of the session's quiz, and a ledger error for duplicates.
    pub fn submit_answer<C: ContentStore, B: Broadcast>(
        &self,
        store: &C,
        broadcast: &B,
        code: &SessionCode,
        participant_id: ParticipantId,
        question_id: QuestionId,
        answer_id: AnswerId,
        response_time_ms: u64,
    ) -> Result<Response, Error> {
        let live = self.live(code)?;
        let mut events: Vec<(ScopeKey, Event)> = Vec::new();
        let result = {
            let mut guard = lock(&live);
            let LiveSession {
                session,
                roster,
                ledger,
            } = &mut *guard;

            let quiz = store.quiz(session.quiz_id())?;
            let question = quiz
                .question(question_id)
                .ok_or(store::Error::QuestionNotFound(question_id))?;
            let answer = question
                .answers
                .iter()
                .find(|a| a.id == answer_id)
                .ok_or(store::Error::AnswerNotFound(answer_id))?;
            let participant = roster
                .get_mut(participant_id)
                .ok_or(Error::ParticipantNotFound(participant_id))?;

            match ledger.record(
                participant,
                question,
                answer,
                response_time_ms,
                quiz.time_per_question,
            ) {
                Ok(response) => {
                    if session.show_immediate_feedback() {
                        events.push((
                            ScopeKey::Participant(code.clone(), participant_id),
                            Event::AnswerResult {
                                question_id,
                                is_correct: response.is_correct,
                                points_earned: response.points_earned,
                                total_score: participant.total_score,
                            },
                        ));
                    }
                    events.push((
                        ScopeKey::Admin(code.clone()),
                        Event::ResponseCount {
                            question_id,
                            count: ledger.response_count_for(question_id),
                        },
                    ));
                    Ok(response)
                }
                Err(err) => {
                    if err == ledger::Error::DuplicateSubmission {
                        tracing::debug!(
                            %code,
                            participant = %participant_id,
                            question = %question_id,
                            "duplicate submission rejected"
                        );
                        events.push((
                            ScopeKey::Participant(code.clone(), participant_id),
                            Event::Error {
                                message: err.to_string(),
                            },
                        ));
                    }
                    Err(Error::Ledger(err))
                }
            }
        };

        for (scope, event) in &events {
            broadcast.publish(scope, event);
        }
        result
    }

    /// Marks a participant's connection as alive or dropped
    ///
    /// A dropped participant keeps their score and place on the scoreboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] or [`Error::ParticipantNotFound`]
    /// for unknown identifiers.
    pub fn set_connected(
        &self,
        code: &SessionCode,
        participant_id: ParticipantId,
        connected: bool,
    ) -> Result<(), Error> {
        let live = self.live(code)?;
        let mut guard = lock(&live);
        guard
            .roster
            .get_mut(participant_id)
            .ok_or(Error::ParticipantNotFound(participant_id))?
            .connected = connected;
        Ok(())
    }

    /// Returns a session's summary
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, or a content
    /// error when the quiz cannot be fetched.
    pub fn session_info<C: ContentStore>(
        &self,
        store: &C,
        code: &SessionCode,
    ) -> Result<SessionInfo, Error> {
        let live = self.live(code)?;
        let guard = lock(&live);
        let quiz = store.quiz(guard.session.quiz_id())?;
        Ok(SessionInfo {
            code: guard.session.code().clone(),
            status: guard.session.status(),
            quiz_id: quiz.id,
            quiz_title: quiz.title,
            current_question_index: guard.session.current_question_index(),
            total_questions: quiz.questions.len(),
            participant_count: guard.roster.len(),
            open_registration: guard.session.registration_open(),
            max_participants: guard.session.max_participants(),
            show_immediate_feedback: guard.session.show_immediate_feedback(),
        })
    }

    /// Returns the current scoreboard without touching the session's state
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code, or a content
    /// error when the quiz cannot be fetched.
    pub fn scoreboard<C: ContentStore>(
        &self,
        store: &C,
        code: &SessionCode,
    ) -> Result<Scoreboard, Error> {
        let live = self.live(code)?;
        let guard = lock(&live);
        let quiz = store.quiz(guard.session.quiz_id())?;
        Ok(ranking::scoreboard(
            &guard.session,
            &quiz,
            &guard.roster,
            self.tie_policy,
        ))
    }

    /// Returns a session's participants in join order
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown code.
    pub fn participants(&self, code: &SessionCode) -> Result<Vec<Participant>, Error> {
        let live = self.live(code)?;
        let guard = lock(&live);
        Ok(guard.roster.iter().cloned().collect())
    }

    /// Lists the codes of all sessions that have not finished
    pub fn active_sessions(&self) -> Vec<SessionCode> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter_map(|live| {
                let guard = lock(live);
                (guard.session.status() != Status::Finished)
                    .then(|| guard.session.code().clone())
            })
            .collect()
    }
}
