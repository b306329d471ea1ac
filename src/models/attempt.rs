// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::id::Id;

/// The graded outcome for a single question within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_index: i64,
    /// Selected option index, or -1 when the question was left unanswered.
    pub selected_option: i64,
    pub is_correct: bool,
    /// Points awarded: 0 or the question's full point value.
    pub points: i64,
}

/// Sentinel for "no answer selected".
pub const UNANSWERED: i64 = -1;

/// Represents the 'attempts' table, joined with the quiz title and the
/// taker's username. Rows are append-only: an attempt is never updated or
/// regraded after insert, and is deleted only by the quiz cascade.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: Id,
    pub user_id: Id,
    pub quiz_id: Id,
    pub answers: Json<Vec<AnswerResult>>,
    pub score: i64,
    pub total_points: i64,
    pub time_spent: i64,
    pub forced_submit: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub quiz_title: String,
    pub username: String,
}

/// One submitted answer, positionally aligned with the quiz's question list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_index: i64,
    #[serde(default = "unanswered")]
    pub selected_option: i64,
}

fn unanswered() -> i64 {
    UNANSWERED
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
    #[validate(range(min = 0, message = "Time spent cannot be negative"))]
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default)]
    pub forced_submit: bool,
}

/// Outbound attempt representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResponse {
    pub id: Id,
    pub user_id: Id,
    pub username: String,
    pub quiz_id: Id,
    pub quiz_title: String,
    pub answers: Vec<AnswerResult>,
    pub score: i64,
    pub total_points: i64,
    pub time_spent: i64,
    pub forced_submit: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl From<Attempt> for AttemptResponse {
    fn from(a: Attempt) -> Self {
        AttemptResponse {
            id: a.id,
            user_id: a.user_id,
            username: a.username,
            quiz_id: a.quiz_id,
            quiz_title: a.quiz_title,
            answers: a.answers.0,
            score: a.score,
            total_points: a.total_points,
            time_spent: a.time_spent,
            forced_submit: a.forced_submit,
            completed_at: a.completed_at,
        }
    }
}

/// Paginated attempt listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptListResponse {
    pub attempts: Vec<AttemptResponse>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_attempts: i64,
}

/// Aggregate statistics over all attempts on one quiz, for its owner.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub total_attempts: i64,
    /// Mean of score/totalPoints across attempts, as a percentage.
    pub average_score_percent: f64,
    pub average_time_spent: f64,
    pub forced_submissions: i64,
}
