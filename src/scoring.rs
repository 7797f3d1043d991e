//! Answer scoring
//!
//! This module implements the pure scoring function: a wrong answer earns
//! nothing, a correct answer earns the question's base points plus a time
//! bonus that shrinks linearly from [`MAX_TIME_BONUS`] at an instant answer
//! to zero at the time limit. It has no dependency on recorded responses.

use std::time::Duration;

use thiserror::Error;

use crate::{
    constants::scoring::MAX_TIME_BONUS,
    quiz::{Answer, Question},
};

/// Errors that can occur when scoring an answer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The question's effective time limit is zero
    ///
    /// Content validation rules this out upstream; scoring refuses to divide
    /// by zero if it ever slips through.
    #[error("question time limit must be positive")]
    ZeroTimeLimit,
}

/// Computes the points earned for choosing `answer` on `question`
///
/// `response_time_ms` is the elapsed time between the question being shown
/// and the submission. `quiz_default` supplies the time limit for questions
/// without their own override. Response times at or beyond the limit earn
/// the base points with no bonus; the bonus never goes negative.
///
/// # Errors
///
/// Returns [`Error::ZeroTimeLimit`] when the effective time limit is zero.
pub fn score(
    question: &Question,
    answer: &Answer,
    response_time_ms: u64,
    quiz_default: Duration,
) -> Result<u64, Error> {
    if !answer.correct {
        return Ok(0);
    }

    let time_limit_ms = u64::try_from(
        question
            .effective_time_limit(quiz_default)
            .as_millis(),
    )
    .unwrap_or(u64::MAX);
    if time_limit_ms == 0 {
        return Err(Error::ZeroTimeLimit);
    }

    let remaining_ms = time_limit_ms.saturating_sub(response_time_ms);
    let bonus_ratio = remaining_ms as f64 / time_limit_ms as f64;
    let time_bonus = (bonus_ratio * MAX_TIME_BONUS as f64).round() as u64;

    Ok(question.points + time_bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{AnswerId, QuestionId};

    fn question(points: u64, time_limit: Option<Duration>) -> Question {
        Question {
            id: QuestionId::new(),
            text: "q".to_owned(),
            points,
            time_limit,
            media_url: None,
            answers: vec![answer(true), answer(false)],
        }
    }

    fn answer(correct: bool) -> Answer {
        Answer {
            id: AnswerId::new(),
            label: "A".to_owned(),
            text: "a".to_owned(),
            correct,
        }
    }

    const DEFAULT: Duration = Duration::from_secs(30);

    #[test]
    fn test_wrong_answer_earns_zero_regardless_of_time() {
        let q = question(10, None);
        let wrong = answer(false);
        for t in [0, 1, 15_000, 30_000, 60_000] {
            assert_eq!(score(&q, &wrong, t, DEFAULT).unwrap(), 0);
        }
    }

    #[test]
    fn test_instant_correct_answer_earns_full_bonus() {
        let q = question(10, None);
        assert_eq!(score(&q, &answer(true), 0, DEFAULT).unwrap(), 15);
    }

    #[test]
    fn test_answer_at_time_limit_earns_base_points() {
        let q = question(10, None);
        assert_eq!(score(&q, &answer(true), 30_000, DEFAULT).unwrap(), 10);
    }

    #[test]
    fn test_answer_beyond_time_limit_never_goes_negative() {
        let q = question(10, None);
        assert_eq!(score(&q, &answer(true), 60_000, DEFAULT).unwrap(), 10);
    }

    #[test]
    fn test_bonus_rounds_to_nearest_integer() {
        // 9000 of 10000 ms remaining: 0.9 * 5 = 4.5 rounds up to 5
        let q = question(10, Some(Duration::from_secs(10)));
        assert_eq!(score(&q, &answer(true), 1_000, DEFAULT).unwrap(), 15);

        // 5000 of 10000 ms remaining: 0.5 * 5 = 2.5 rounds up to 3
        assert_eq!(score(&q, &answer(true), 5_000, DEFAULT).unwrap(), 13);

        // 3000 of 10000 ms remaining: 0.3 * 5 = 1.5 rounds up to 2
        assert_eq!(score(&q, &answer(true), 7_000, DEFAULT).unwrap(), 12);
    }

    #[test]
    fn test_question_override_beats_quiz_default() {
        let q = question(10, Some(Duration::from_secs(10)));
        // At the 10s override limit, no bonus even though the default is 30s.
        assert_eq!(score(&q, &answer(true), 10_000, DEFAULT).unwrap(), 10);
    }

    #[test]
    fn test_zero_time_limit_is_rejected() {
        let q = question(10, Some(Duration::ZERO));
        assert_eq!(
            score(&q, &answer(true), 0, DEFAULT),
            Err(Error::ZeroTimeLimit)
        );
    }

    #[test]
    fn test_zero_time_limit_still_scores_wrong_answers() {
        // A wrong answer short-circuits before the limit is touched.
        let q = question(10, Some(Duration::ZERO));
        assert_eq!(score(&q, &answer(false), 0, DEFAULT).unwrap(), 0);
    }
}
