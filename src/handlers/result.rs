// src/handlers/result.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::question::load_pool,
    models::result::{AssessmentResult, ResultSheet, ResultSheetDetail, ResultSummary},
};

/// Lists stored results with their quiz titles, newest first.
pub async fn list_results(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ResultSummary>(
        r#"
        SELECT
            r.id,
            r.quiz_id,
            z.title AS quiz_title,
            r.score,
            r.time_taken_ms,
            r.date_completed
        FROM results r
        JOIN quizzes z ON z.id = r.quiz_id
        ORDER BY r.date_completed DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Retrieves a single result as a review sheet: every stored verdict is
/// re-joined to the current question content through its original pool
/// index, revealing the correct flags and answer notes for review.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query_as::<_, AssessmentResult>(
        r#"
        SELECT id, assessment_id, quiz_id, score, time_taken_ms, date_completed, details
        FROM results
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Result not found".to_string()))?;

    let quiz_title = sqlx::query_scalar::<_, String>("SELECT title FROM quizzes WHERE id = ?")
        .bind(&result.quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = load_pool(&pool, &result.quiz_id).await?;

    let details = result
        .details
        .0
        .iter()
        .map(|detail| {
            // The pool may have been edited since the assessment ran; a
            // verdict whose index no longer resolves keeps its stored
            // answer data but loses the content join.
            let question = questions.get(detail.question_index);
            ResultSheetDetail {
                detail: detail.clone(),
                question_title: question
                    .map(|q| q.title.clone())
                    .unwrap_or_else(|| "(question removed)".to_string()),
                options: question.map(|q| q.options.0.clone()).unwrap_or_default(),
                answer_note: question.and_then(|q| q.answer_note.clone()),
            }
        })
        .collect();

    Ok(Json(ResultSheet {
        id: result.id,
        assessment_id: result.assessment_id,
        quiz_id: result.quiz_id,
        quiz_title,
        score: result.score,
        time_taken_ms: result.time_taken_ms,
        date_completed: result.date_completed,
        details,
    }))
}
