// src/handlers/quiz.rs

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
        pagination::{PageParams, total_pages},
        quiz::{CreateQuizRequest, Question, Quiz, QuizListResponse},
    },
    utils::jwt::Claims,
};

const QUIZ_SELECT: &str = r#"
    SELECT q.id, q.title, q.description, q.questions, q.time_limit,
           q.category, q.is_public, q.created_by,
           u.username AS creator_username, q.created_at
    FROM quizzes q
    JOIN users u ON q.created_by = u.id
"#;

/// Parses a path identifier, mapping malformed input to a 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Id, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} ID format")))
}

/// Fetches one quiz row (with creator username) or 404s.
pub(crate) async fn fetch_quiz(pool: &PgPool, id: &Id) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(&format!("{QUIZ_SELECT} WHERE q.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Creates a new quiz owned by the caller.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    let questions: Vec<Question> = payload.questions.into_iter().map(Question::from).collect();

    let quiz_id = Id::new();
    sqlx::query(
        r#"
        INSERT INTO quizzes (id, title, description, questions, time_limit, category, is_public, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&quiz_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(SqlJson(&questions))
    .bind(payload.time_limit)
    .bind(&payload.category)
    .bind(payload.is_public)
    .bind(&user_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let quiz = fetch_quiz(&pool, &quiz_id).await?;
    Ok((StatusCode::CREATED, Json(quiz.into_response(false))))
}

/// Lists public quizzes, newest first, paginated.
/// Correct answers are always withheld here.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.window();

    let quizzes = sqlx::query_as::<_, Quiz>(&format!(
        "{QUIZ_SELECT} WHERE q.is_public ORDER BY q.created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE is_public")
        .fetch_one(&pool)
        .await?;

    Ok(Json(QuizListResponse {
        quizzes: quizzes.into_iter().map(|q| q.into_response(true)).collect(),
        current_page: page,
        total_pages: total_pages(total, limit),
        total_quizzes: total,
    }))
}

/// Lists the caller's own quizzes, answers included.
pub async fn list_my_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let (page, limit, offset) = params.window();

    let quizzes = sqlx::query_as::<_, Quiz>(&format!(
        "{QUIZ_SELECT} WHERE q.created_by = $1 ORDER BY q.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(&user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE created_by = $1")
        .bind(&user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(QuizListResponse {
        quizzes: quizzes.into_iter().map(|q| q.into_response(false)).collect(),
        current_page: page,
        total_pages: total_pages(total, limit),
        total_quizzes: total,
    }))
}

/// Fetches a single quiz.
/// Private quizzes are only visible to their owner (or an admin); correct
/// answers are withheld from everyone else.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&id, "quiz")?;
    let user_id = claims.user_id()?;

    let quiz = fetch_quiz(&pool, &quiz_id).await?;

    let is_owner = quiz.created_by == user_id;
    if !quiz.is_public && !is_owner && !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let redact = !is_owner && !claims.is_admin();
    Ok(Json(quiz.into_response(redact)))
}

/// Replaces a quiz's content. Owner only; the payload is revalidated in full.
/// Attempts graded before the edit keep their stored snapshot.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&id, "quiz")?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_quiz(&pool, &quiz_id).await?;
    if quiz.created_by != claims.user_id()? {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let questions: Vec<Question> = payload.questions.into_iter().map(Question::from).collect();

    sqlx::query(
        r#"
        UPDATE quizzes
        SET title = $1, description = $2, questions = $3,
            time_limit = $4, category = $5, is_public = $6
        WHERE id = $7
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(SqlJson(&questions))
    .bind(payload.time_limit)
    .bind(&payload.category)
    .bind(payload.is_public)
    .bind(&quiz_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = fetch_quiz(&pool, &quiz_id).await?;
    Ok(Json(updated.into_response(false)))
}

/// Deletes a quiz and all attempts made against it.
/// Owner or admin only. Both deletes run in one transaction so a crash can
/// never leave orphaned attempts behind.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_id = parse_id(&id, "quiz")?;

    let quiz = fetch_quiz(&pool, &quiz_id).await?;
    if quiz.created_by != claims.user_id()? && !claims.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM attempts WHERE quiz_id = $1")
        .bind(&quiz_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(&quiz_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete quiz {}: {:?}", quiz_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "message": "Quiz deleted successfully"
    })))
}
