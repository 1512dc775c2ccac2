// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlxJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{
        CreateQuestionRequest, Question, UpdateQuestionRequest, validate_options,
    },
    utils::id::generate_id,
};

/// Loads a quiz's full ordered question pool. Shared by the assessment
/// and result handlers, which both need pool indices to line up.
pub(crate) async fn load_pool(
    pool: &SqlitePool,
    quiz_id: &str,
) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, position, title, options, answer_note, image_uri, created_at
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

async fn ensure_quiz_exists(pool: &SqlitePool, quiz_id: &str) -> Result<(), AppError> {
    sqlx::query_scalar::<_, String>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    Ok(())
}

/// Lists a quiz's question pool in pool order, correct flags included --
/// this is the authoring view, not the test-taking one.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_quiz_exists(&pool, &quiz_id).await?;
    let questions = load_pool(&pool, &quiz_id).await?;
    Ok(Json(questions))
}

/// Appends a new question at the end of the quiz's pool.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_quiz_exists(&pool, &quiz_id).await?;

    let position = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM questions WHERE quiz_id = ?",
    )
    .bind(&quiz_id)
    .fetch_one(&pool)
    .await?;

    let id = generate_id("n");

    sqlx::query(
        r#"
        INSERT INTO questions (id, quiz_id, position, title, options, answer_note, image_uri, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&quiz_id)
    .bind(position)
    .bind(&payload.title)
    .bind(SqlxJson(&payload.options))
    .bind(&payload.answer_note)
    .bind(&payload.image_uri)
    .bind(chrono::Utc::now())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "position": position })),
    ))
}

/// Updates a question by ID.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path((quiz_id, id)): Path<(String, String)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none()
        && payload.options.is_none()
        && payload.answer_note.is_none()
        && payload.image_uri.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(ref options) = payload.options {
        validate_options(options)
            .map_err(|e| AppError::BadRequest(e.code.to_string()))?;
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(SqlxJson(options));
    }

    if let Some(answer_note) = payload.answer_note {
        separated.push("answer_note = ");
        separated.push_bind_unseparated(answer_note);
    }

    if let Some(image_uri) = payload.image_uri {
        separated.push("image_uri = ");
        separated.push_bind_unseparated(image_uri);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(&id);
    builder.push(" AND quiz_id = ");
    builder.push_bind(&quiz_id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question by ID and closes the gap in pool positions so the
/// remaining questions keep a dense 0..n index sequence.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path((quiz_id, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let position = sqlx::query_scalar::<_, i64>(
        "SELECT position FROM questions WHERE id = ? AND quiz_id = ?",
    )
    .bind(&id)
    .bind(&quiz_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await?;

    sqlx::query("UPDATE questions SET position = position - 1 WHERE quiz_id = ? AND position > ?")
        .bind(&quiz_id)
        .bind(position)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resequence questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}
