// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    id::Id,
    models::{
        attempt::{Attempt, AttemptListResponse, AttemptResponse, QuizStats, SubmitAttemptRequest},
        pagination::{PageParams, total_pages},
    },
    scoring,
    utils::jwt::Claims,
};

use super::quiz::{fetch_quiz, parse_id};

const ATTEMPT_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.quiz_id, a.answers, a.score, a.total_points,
           a.time_spent, a.forced_submit, a.completed_at,
           q.title AS quiz_title, u.username
    FROM attempts a
    JOIN quizzes q ON a.quiz_id = q.id
    JOIN users u ON a.user_id = u.id
"#;

/// Submits a quiz attempt: Validated -> Scored -> Persisted -> Acknowledged.
///
/// The quiz owner may not attempt their own quiz (it would inflate the quiz's
/// statistics). Scoring happens server-side; the stored attempt is an
/// immutable snapshot and is never regraded. No retry is attempted here:
/// a resubmission after a failure creates a second attempt.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&quiz_id, "quiz")?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    let quiz = fetch_quiz(&pool, &quiz_id).await?;

    if quiz.created_by == user_id {
        return Err(AppError::Forbidden("You cannot take your own quiz".to_string()));
    }

    let graded = scoring::grade(&quiz.questions.0, &payload.answers);

    let attempt_id = Id::new();
    sqlx::query(
        r#"
        INSERT INTO attempts (id, user_id, quiz_id, answers, score, total_points, time_spent, forced_submit)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&attempt_id)
    .bind(&user_id)
    .bind(&quiz_id)
    .bind(SqlJson(&graded.answers))
    .bind(graded.score)
    .bind(graded.total_points)
    .bind(payload.time_spent)
    .bind(payload.forced_submit)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let attempt = fetch_attempt(&pool, &attempt_id).await?;
    Ok((StatusCode::CREATED, Json(AttemptResponse::from(attempt))))
}

/// Lists the caller's own attempts on one quiz, newest first, paginated.
/// No prior attempt is a normal empty page, not an error.
pub async fn list_my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&quiz_id, "quiz")?;
    let user_id = claims.user_id()?;
    let (page, limit, offset) = params.window();

    let attempts = sqlx::query_as::<_, Attempt>(&format!(
        "{ATTEMPT_SELECT} WHERE a.user_id = $1 AND a.quiz_id = $2
         ORDER BY a.completed_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(&user_id)
    .bind(&quiz_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE user_id = $1 AND quiz_id = $2")
            .bind(&user_id)
            .bind(&quiz_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(AttemptListResponse {
        attempts: attempts.into_iter().map(AttemptResponse::from).collect(),
        current_page: page,
        total_pages: total_pages(total, limit),
        total_attempts: total,
    }))
}

/// Lists every attempt on one quiz. Quiz owner or admin only.
pub async fn list_quiz_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&quiz_id, "quiz")?;
    let quiz = fetch_quiz(&pool, &quiz_id).await?;

    if quiz.created_by != claims.user_id()? && !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let (page, limit, offset) = params.window();

    let attempts = sqlx::query_as::<_, Attempt>(&format!(
        "{ATTEMPT_SELECT} WHERE a.quiz_id = $1
         ORDER BY a.completed_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(&quiz_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE quiz_id = $1")
        .bind(&quiz_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(AttemptListResponse {
        attempts: attempts.into_iter().map(AttemptResponse::from).collect(),
        current_page: page,
        total_pages: total_pages(total, limit),
        total_attempts: total,
    }))
}

/// Aggregate statistics over all attempts on one quiz. Owner or admin only.
pub async fn quiz_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&quiz_id, "quiz")?;
    let quiz = fetch_quiz(&pool, &quiz_id).await?;

    if quiz.created_by != claims.user_id()? && !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let stats = sqlx::query_as::<_, QuizStats>(
        r#"
        SELECT
            COUNT(*) AS total_attempts,
            COALESCE(AVG(CASE WHEN total_points > 0
                              THEN score::float8 / total_points * 100
                              ELSE 0 END), 0) AS average_score_percent,
            COALESCE(AVG(time_spent::float8), 0) AS average_time_spent,
            COUNT(*) FILTER (WHERE forced_submit) AS forced_submissions
        FROM attempts
        WHERE quiz_id = $1
        "#,
    )
    .bind(&quiz_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(stats))
}

/// Fetches a single attempt.
/// Visible to the attempt owner, the quiz owner, or an admin.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attempt_id = parse_id(&attempt_id, "attempt")?;
    let user_id = claims.user_id()?;

    let attempt = fetch_attempt(&pool, &attempt_id).await?;

    let quiz_owner: Id = sqlx::query_scalar("SELECT created_by FROM quizzes WHERE id = $1")
        .bind(&attempt.quiz_id)
        .fetch_one(&pool)
        .await?;

    let is_attempt_owner = attempt.user_id == user_id;
    let is_quiz_owner = quiz_owner == user_id;
    if !is_attempt_owner && !is_quiz_owner && !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(AttemptResponse::from(attempt)))
}

async fn fetch_attempt(pool: &PgPool, id: &Id) -> Result<Attempt, AppError> {
    sqlx::query_as::<_, Attempt>(&format!("{ATTEMPT_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))
}
