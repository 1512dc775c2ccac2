// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::core::grader;

/// One answer option. Identity is positional: the option's index within
/// its question's list is what selected/correct answer arrays refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub title: String,
    /// Whether this option is a (or the) correct choice.
    #[serde(default)]
    pub correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub quiz_id: String,

    /// 0-based index within the quiz's ordered pool.
    pub position: i64,

    pub title: String,

    /// Option list, stored as a JSON array in the database.
    pub options: Json<Vec<AnswerOption>>,

    /// Optional explanation shown when reviewing results.
    pub answer_note: Option<String>,

    pub image_uri: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for delivering a question to a test-taker: correct flags and the
/// answer note are stripped, only titles remain. `multiSelect` tells the
/// client whether to render checkboxes or radios.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub title: String,
    pub options: Vec<String>,
    pub image_uri: Option<String>,
    pub multi_select: bool,
}

impl PublicQuestion {
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            title: question.title.clone(),
            options: question.options.iter().map(|o| o.title.clone()).collect(),
            image_uri: question.image_uri.clone(),
            multi_select: grader::is_multi_select(&question.options),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<AnswerOption>,
    #[validate(length(max = 2000))]
    pub answer_note: Option<String>,
    #[validate(length(max = 500))]
    pub image_uri: Option<String>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub title: Option<String>,
    pub options: Option<Vec<AnswerOption>>,
    pub answer_note: Option<String>,
    pub image_uri: Option<String>,
}

/// Authoring invariant: a gradeable question needs at least one correct
/// and at least one incorrect option. Grading assumes this already holds.
pub fn validate_options(options: &[AnswerOption]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("needs_at_least_two_options"));
    }
    if !options.iter().any(|o| o.correct) {
        return Err(validator::ValidationError::new("needs_a_correct_option"));
    }
    if options.iter().all(|o| o.correct) {
        return Err(validator::ValidationError::new("needs_an_incorrect_option"));
    }
    for opt in options {
        if opt.title.is_empty() || opt.title.len() > 500 {
            return Err(validator::ValidationError::new("option_title_length"));
        }
    }
    Ok(())
}
