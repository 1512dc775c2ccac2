// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::question::AnswerOption;

/// Per-question verdict inside a stored result. Answer arrays are the
/// sorted list serialization of the selected/correct option-index sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDetail {
    pub question_id: String,
    /// Index into the original, unrestricted pool. The results viewer
    /// re-joins verdicts to question content through this.
    pub question_index: usize,
    pub selected_answer: Vec<usize>,
    pub correct_answer: Vec<usize>,
    pub answered_correctly: bool,
}

/// Represents the 'results' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub id: String,
    pub assessment_id: String,
    pub quiz_id: String,
    pub score: i64,
    pub time_taken_ms: i64,
    pub date_completed: chrono::DateTime<chrono::Utc>,
    pub details: Json<Vec<ResultDetail>>,
}

/// Result list entry joined with its quiz title.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: i64,
    pub time_taken_ms: i64,
    pub date_completed: chrono::DateTime<chrono::Utc>,
}

/// One row of the result review sheet: the stored verdict re-joined with
/// the current question content (including correct flags and the note,
/// since review is where those are revealed).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSheetDetail {
    #[serde(flatten)]
    pub detail: ResultDetail,
    pub question_title: String,
    pub options: Vec<AnswerOption>,
    pub answer_note: Option<String>,
}

/// DTO for the result detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSheet {
    pub id: String,
    pub assessment_id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: i64,
    pub time_taken_ms: i64,
    pub date_completed: chrono::DateTime<chrono::Utc>,
    pub details: Vec<ResultSheetDetail>,
}
