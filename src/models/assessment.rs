// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Configuration for one assessment run: how many questions to ask, the
/// 1-indexed inclusive pool range to draw them from, whether to randomize
/// the draw, and an optional time limit in minutes (0/absent = untimed,
/// capped at one week).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfig {
    pub total_questions: i64,
    pub range_from: i64,
    pub range_to: i64,
    #[serde(default)]
    pub randomize: bool,
    #[validate(range(min = 0, max = 10_080))]
    pub time_limit: Option<i64>,
}

/// Represents the 'assessments' table in the database.
///
/// `question_order` is the explicit permutation of original-pool indices
/// recorded at creation; it is the durable replay key for the instance.
#[derive(Debug, Clone, FromRow)]
pub struct Assessment {
    pub id: String,
    pub quiz_id: String,
    pub total_questions: i64,
    pub range_from: i64,
    pub range_to: i64,
    pub randomize: bool,
    pub time_limit: Option<i64>,
    pub question_order: Json<Vec<usize>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished: bool,
}

/// DTO for delivering an assessment instance to a test-taker, with the
/// presented questions resolved (in presentation order) and the remaining
/// seconds for timed runs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub total_questions: i64,
    pub range_from: i64,
    pub range_to: i64,
    pub randomize: bool,
    pub time_limit: Option<i64>,
    pub order: Vec<usize>,
    pub questions: Vec<PublicQuestion>,
    pub time_left: Option<i64>,
    pub finished: bool,
}

/// One answer-tracking event against a live assessment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    /// Presentation index of the question being answered.
    pub slot: usize,
    /// Positional index of the option within the question.
    pub option: usize,
    pub action: AnswerAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerAction {
    /// Add to a multi-select membership set.
    ToggleOn,
    /// Remove from a multi-select membership set.
    ToggleOff,
    /// Single-select: replace the whole selection with this option.
    Choose,
}

/// DTO echoing a slot's selection after an answer event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerStateResponse {
    pub slot: usize,
    pub selected_answer: Vec<usize>,
}
