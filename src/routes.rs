// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{assessment, question, quiz, result},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quizzes, assessments, results).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + session store).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route(
            "/{id}/questions",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/{id}/questions/{qid}",
            put(question::update_question).delete(question::delete_question),
        )
        .route("/{id}/assessments", post(assessment::create_assessment));

    let assessment_routes = Router::new()
        .route("/{id}", get(assessment::get_assessment))
        .route("/{id}/answers", put(assessment::record_answer))
        .route("/{id}/submit", post(assessment::submit_assessment));

    let result_routes = Router::new()
        .route("/", get(result::list_results))
        .route("/{id}", get(result::get_result));

    Router::new()
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/assessments", assessment_routes)
        .nest("/api/results", result_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
