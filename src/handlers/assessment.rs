// src/handlers/assessment.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, types::Json as SqlxJson};
use validator::Validate;

use crate::{
    core::{
        answers::AnswerSheet,
        grader::{self, GradeInput},
        selector,
        timer::{Countdown, CountdownState},
    },
    error::AppError,
    handlers::question::load_pool,
    models::{
        assessment::{
            AnswerAction, AnswerEvent, AnswerStateResponse, Assessment, AssessmentConfig,
            AssessmentResponse,
        },
        question::{PublicQuestion, Question},
        result::AssessmentResult,
    },
    state::AppState,
    utils::id::generate_id,
};

async fn load_assessment(pool: &SqlitePool, id: &str) -> Result<Assessment, AppError> {
    sqlx::query_as::<_, Assessment>(
        r#"
        SELECT id, quiz_id, total_questions, range_from, range_to, randomize,
               time_limit, question_order, started_at, finished
        FROM assessments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Assessment not found".to_string()))
}

async fn quiz_title(pool: &SqlitePool, quiz_id: &str) -> Result<String, AppError> {
    sqlx::query_scalar::<_, String>("SELECT title FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

fn countdown(assessment: &Assessment) -> Countdown {
    Countdown::new(assessment.started_at, assessment.time_limit.unwrap_or(0))
}

fn build_response(
    assessment: &Assessment,
    quiz_title: String,
    pool: &[Question],
    now: DateTime<Utc>,
) -> AssessmentResponse {
    let questions = assessment
        .question_order
        .iter()
        .map(|&index| PublicQuestion::from_question(&pool[index]))
        .collect();

    AssessmentResponse {
        id: assessment.id.clone(),
        quiz_id: assessment.quiz_id.clone(),
        quiz_title,
        total_questions: assessment.total_questions,
        range_from: assessment.range_from,
        range_to: assessment.range_to,
        randomize: assessment.randomize,
        time_limit: assessment.time_limit,
        order: assessment.question_order.0.clone(),
        time_left: countdown(assessment).time_left(now),
        finished: assessment.finished,
        questions,
    }
}

/// Begins an assessment: runs the Selector once over the quiz's pool,
/// persists the resulting order array as the instance's durable replay
/// key, and registers an empty in-memory answer sheet.
pub async fn create_assessment(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<AssessmentConfig>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = quiz_title(&state.pool, &quiz_id).await?;
    let pool = load_pool(&state.pool, &quiz_id).await?;

    let order = selector::select(pool.len(), &payload, &mut rand::rng())?;

    let id = generate_id("a");
    let started_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO assessments
        (id, quiz_id, total_questions, range_from, range_to, randomize,
         time_limit, question_order, started_at, finished)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(&id)
    .bind(&quiz_id)
    .bind(payload.total_questions)
    .bind(payload.range_from)
    .bind(payload.range_to)
    .bind(payload.randomize)
    .bind(payload.time_limit)
    .bind(SqlxJson(&order))
    .bind(started_at)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    state.sessions.register(&id, AnswerSheet::new(order.len()));

    tracing::info!(
        assessment = %id,
        quiz = %quiz_id,
        presented = order.len(),
        randomize = payload.randomize,
        "assessment started"
    );

    let assessment = Assessment {
        id,
        quiz_id,
        total_questions: payload.total_questions,
        range_from: payload.range_from,
        range_to: payload.range_to,
        randomize: payload.randomize,
        time_limit: payload.time_limit,
        question_order: SqlxJson(order),
        started_at,
        finished: false,
    };

    let response = build_response(&assessment, title, &pool, started_at);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetches an assessment in reconstruction mode: the presented set is
/// re-derived from the stored order array by direct lookup, never by
/// re-running the randomization, so a page reload shows the same fixed
/// questions. A live answer sheet is re-registered if the server lost it.
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&state.pool, &id).await?;
    let title = quiz_title(&state.pool, &assessment.quiz_id).await?;
    let pool = load_pool(&state.pool, &assessment.quiz_id).await?;

    selector::reconstruct(pool.len(), &assessment.question_order)?;

    if !assessment.finished {
        state
            .sessions
            .register_if_absent(&id, assessment.question_order.len());
    }

    let response = build_response(&assessment, title, &pool, Utc::now());
    Ok(Json(response))
}

/// Applies one answer-tracking event to the live sheet: toggle-on and
/// toggle-off mutate a multi-select membership set, choose replaces a
/// single-select answer wholesale.
pub async fn record_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<AnswerEvent>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&state.pool, &id).await?;
    if assessment.finished {
        return Err(AppError::Conflict(
            "Assessment is already finished".to_string(),
        ));
    }
    if countdown(&assessment).state(Utc::now()) == CountdownState::Expired {
        return Err(AppError::Conflict("Time limit has expired".to_string()));
    }

    let order = &assessment.question_order.0;
    let pool_index = *order.get(event.slot).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Slot {} is out of bounds for {} presented questions",
            event.slot,
            order.len()
        ))
    })?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, position, title, options, answer_note, image_uri, created_at
        FROM questions
        WHERE quiz_id = ? AND position = ?
        "#,
    )
    .bind(&assessment.quiz_id)
    .bind(pool_index as i64)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| {
        AppError::InternalServerError(format!(
            "Stored order references missing pool index {}",
            pool_index
        ))
    })?;

    if event.option >= question.options.len() {
        return Err(AppError::BadRequest(format!(
            "Option {} is out of bounds for {} options",
            event.option,
            question.options.len()
        )));
    }

    state.sessions.register_if_absent(&id, order.len());

    let selected = state
        .sessions
        .with_sheet(&id, |sheet| {
            match event.action {
                AnswerAction::ToggleOn => sheet.toggle_on(event.slot, event.option),
                AnswerAction::ToggleOff => sheet.toggle_off(event.slot, event.option),
                AnswerAction::Choose => sheet.choose_single(event.slot, event.option),
            };
            sheet
                .selected(event.slot)
                .map(|set| set.iter().copied().collect::<Vec<_>>())
                .unwrap_or_default()
        })
        .ok_or_else(|| {
            AppError::InternalServerError("Answer sheet disappeared mid-request".to_string())
        })?;

    Ok(Json(AnswerStateResponse {
        slot: event.slot,
        selected_answer: selected,
    }))
}

/// Manual submission. While the clock is running every presented question
/// must have a non-empty selection; the first unanswered slot is reported
/// back so the client can navigate to it. Once the time limit has expired
/// the gate is waived and whatever was accumulated is graded as-is.
pub async fn submit_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = load_assessment(&state.pool, &id).await?;
    if assessment.finished {
        return Err(AppError::Conflict(
            "Assessment was already submitted".to_string(),
        ));
    }

    let now = Utc::now();
    let expired = countdown(&assessment).state(now) == CountdownState::Expired;

    if !expired {
        let sheet = state
            .sessions
            .snapshot(&id)
            .unwrap_or_else(|| AnswerSheet::new(assessment.question_order.len()));
        if let Some(first_unanswered) = sheet.first_unanswered() {
            return Err(AppError::IncompleteAnswers { first_unanswered });
        }
    }

    let result = finalize(&state, &assessment, now).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Grades and persists an assessment, transitioning it to finished.
///
/// Shared by manual submission and the expiry sweeper; the conditional
/// UPDATE on the finished flag is the guard that makes the race between
/// the two settle on exactly one stored result. Claim and result insert
/// commit in one transaction, and the live sheet is only drained after
/// commit, so a failed insert leaves the assessment submittable again.
pub(crate) async fn finalize(
    state: &AppState,
    assessment: &Assessment,
    now: DateTime<Utc>,
) -> Result<AssessmentResult, AppError> {
    let pool = load_pool(&state.pool, &assessment.quiz_id).await?;
    let order = &assessment.question_order.0;
    selector::reconstruct(pool.len(), order)?;

    let sheet = state
        .sessions
        .snapshot(&assessment.id)
        .unwrap_or_else(|| AnswerSheet::new(order.len()));

    let presented: Vec<GradeInput<'_>> = order
        .iter()
        .map(|&index| GradeInput {
            question_id: &pool[index].id,
            question_index: index,
            options: &pool[index].options,
        })
        .collect();

    let graded = grader::grade(&presented, &sheet);

    let result_id = generate_id("r");
    let time_taken_ms = (now - assessment.started_at).num_milliseconds();

    let mut tx = state.pool.begin().await?;

    let claimed = sqlx::query("UPDATE assessments SET finished = 1 WHERE id = ? AND finished = 0")
        .bind(&assessment.id)
        .execute(&mut *tx)
        .await?;

    if claimed.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Assessment was already submitted".to_string(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO results
        (id, assessment_id, quiz_id, score, time_taken_ms, date_completed, details)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&result_id)
    .bind(&assessment.id)
    .bind(&assessment.quiz_id)
    .bind(graded.score)
    .bind(time_taken_ms)
    .bind(now)
    .bind(SqlxJson(&graded.details))
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    state.sessions.remove(&assessment.id);

    tracing::info!(
        assessment = %assessment.id,
        result = %result_id,
        score = graded.score,
        "assessment finished"
    );

    Ok(AssessmentResult {
        id: result_id,
        assessment_id: assessment.id.clone(),
        quiz_id: assessment.quiz_id.clone(),
        score: graded.score,
        time_taken_ms,
        date_completed: now,
        details: SqlxJson(graded.details),
    })
}
