// tests/assessment_tests.rs

use std::collections::HashSet;
use std::str::FromStr;

use quizboard::{config::Config, routes, sessions::SessionStore, state::AppState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

async fn spawn_app() -> String {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse SQLite options")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        cors_origins: vec![],
    };

    let state = AppState {
        pool,
        config,
        sessions: SessionStore::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Like spawn_app, but also hands back the state so a test can reach the
/// database and session store directly.
async fn spawn_app_with_state() -> (String, AppState) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse SQLite options")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        cors_origins: vec![],
    };

    let state = AppState {
        pool,
        config,
        sessions: SessionStore::new(),
    };

    let app = routes::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, state)
}

/// Creates a quiz with `count` single-select questions of 3 options each;
/// option 1 is always the correct one.
async fn seed_quiz(client: &reqwest::Client, address: &str, count: usize) -> String {
    let response = client
        .post(format!("{}/api/quizzes", address))
        .json(&serde_json::json!({ "title": "Capitals" }))
        .send()
        .await
        .expect("Failed to create quiz");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let quiz_id = body["id"].as_str().unwrap().to_string();

    for i in 0..count {
        let response = client
            .post(format!("{}/api/quizzes/{}/questions", address, quiz_id))
            .json(&serde_json::json!({
                "title": format!("Question {}", i),
                "options": [
                    { "title": "wrong", "correct": false },
                    { "title": "right", "correct": true },
                    { "title": "also wrong", "correct": false },
                ],
                "answerNote": format!("Note {}", i),
            }))
            .send()
            .await
            .expect("Failed to create question");
        assert_eq!(response.status().as_u16(), 201);
    }

    quiz_id
}

async fn begin_assessment(
    client: &reqwest::Client,
    address: &str,
    quiz_id: &str,
    config: serde_json::Value,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/quizzes/{}/assessments", address, quiz_id))
        .json(&config)
        .send()
        .await
        .expect("Failed to create assessment");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn answer(
    client: &reqwest::Client,
    address: &str,
    assessment_id: &str,
    slot: usize,
    option: usize,
    action: &str,
) -> reqwest::Response {
    client
        .put(format!("{}/api/assessments/{}/answers", address, assessment_id))
        .json(&serde_json::json!({ "slot": slot, "option": option, "action": action }))
        .send()
        .await
        .expect("Failed to record answer")
}

#[tokio::test]
async fn sequential_assessment_end_to_end() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 5).await;

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 3, "rangeFrom": 1, "rangeTo": 5, "randomize": false
        }),
    )
    .await;

    let assessment_id = assessment["id"].as_str().unwrap();
    assert_eq!(assessment["order"], serde_json::json!([0, 1, 2]));
    assert_eq!(assessment["questions"].as_array().unwrap().len(), 3);
    assert_eq!(assessment["questions"][0]["multiSelect"], false);
    assert!(assessment["timeLeft"].is_null());
    // Correct flags and notes are stripped from the delivery DTO.
    assert_eq!(assessment["questions"][0]["options"][1], "right");
    assert!(assessment["questions"][0].get("answerNote").is_none());

    // Right, wrong, right.
    answer(&client, &address, assessment_id, 0, 1, "choose").await;
    answer(&client, &address, assessment_id, 1, 0, "choose").await;
    answer(&client, &address, assessment_id, 2, 1, "choose").await;

    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let result: serde_json::Value = response.json().await.unwrap();

    // floor(100 * 2 / 3) = 66, never 67.
    assert_eq!(result["score"], 66);
    let details = result["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert_eq!(details[0]["answeredCorrectly"], true);
    assert_eq!(details[1]["answeredCorrectly"], false);
    assert_eq!(details[1]["questionIndex"], 1);
    assert_eq!(details[1]["selectedAnswer"], serde_json::json!([0]));
    assert_eq!(details[1]["correctAnswer"], serde_json::json!([1]));
    assert_eq!(details[2]["answeredCorrectly"], true);
    assert!(result["timeTakenMs"].as_i64().unwrap() >= 0);

    // Result review re-joins verdicts to question content by pool index.
    let result_id = result["id"].as_str().unwrap();
    let sheet: serde_json::Value = client
        .get(format!("{}/api/results/{}", address, result_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sheet["quizTitle"], "Capitals");
    assert_eq!(sheet["score"], 66);
    assert_eq!(sheet["details"][1]["questionTitle"], "Question 1");
    assert_eq!(sheet["details"][1]["answerNote"], "Note 1");
    assert_eq!(sheet["details"][1]["options"][1]["correct"], true);

    let listing: serde_json::Value = client
        .get(format!("{}/api/results", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["id"], result_id);
}

#[tokio::test]
async fn manual_submit_blocks_on_first_unanswered_question() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 3).await;

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 3, "rangeFrom": 1, "rangeTo": 3, "randomize": false
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();

    // Question 2 (slot index 1) is left unanswered.
    answer(&client, &address, assessment_id, 0, 1, "choose").await;
    answer(&client, &address, assessment_id, 2, 1, "choose").await;

    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["firstUnanswered"], 1);

    // Recoverable: answer the slot and submit again.
    answer(&client, &address, assessment_id, 1, 0, "choose").await;
    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Submitting twice conflicts.
    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn single_select_choice_replaces_previous_answer() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 1).await;

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 1, "randomize": false
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();

    let state: serde_json::Value = answer(&client, &address, assessment_id, 0, 0, "choose")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(state["selectedAnswer"], serde_json::json!([0]));

    let state: serde_json::Value = answer(&client, &address, assessment_id, 0, 2, "choose")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(state["selectedAnswer"], serde_json::json!([2]));
}

#[tokio::test]
async fn multi_select_requires_exact_set_over_http() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quizzes", address))
        .json(&serde_json::json!({ "title": "Multi" }))
        .send()
        .await
        .unwrap();
    let quiz_id = response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Correct set is {0, 2}.
    let response = client
        .post(format!("{}/api/quizzes/{}/questions", address, quiz_id))
        .json(&serde_json::json!({
            "title": "Pick two",
            "options": [
                { "title": "a", "correct": true },
                { "title": "b", "correct": false },
                { "title": "c", "correct": true },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 1, "randomize": false
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();
    assert_eq!(assessment["questions"][0]["multiSelect"], true);

    // Toggle through {0} -> {0,1} -> {0} -> {0,2}.
    answer(&client, &address, assessment_id, 0, 0, "toggle-on").await;
    answer(&client, &address, assessment_id, 0, 1, "toggle-on").await;
    answer(&client, &address, assessment_id, 0, 1, "toggle-off").await;
    let state: serde_json::Value = answer(&client, &address, assessment_id, 0, 2, "toggle-on")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(state["selectedAnswer"], serde_json::json!([0, 2]));

    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 100);
    assert_eq!(result["details"][0]["answeredCorrectly"], true);
}

#[tokio::test]
async fn randomized_selection_stays_in_range_and_reconstructs() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 6).await;

    // totalQuestions clamps from 10 to the restricted length 4.
    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 10, "rangeFrom": 2, "rangeTo": 5, "randomize": true
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();

    let order: Vec<usize> = assessment["order"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap() as usize)
        .collect();
    assert_eq!(order.len(), 4);
    assert_eq!(order.iter().collect::<HashSet<_>>().len(), 4);
    assert!(order.iter().all(|&i| (1..=4).contains(&i)));

    // Reconstruction mode: a reload sees the identical presented set.
    let reloaded: serde_json::Value = client
        .get(format!("{}/api/assessments/{}", address, assessment_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reloaded["order"], assessment["order"]);
    assert_eq!(reloaded["questions"], assessment["questions"]);
}

#[tokio::test]
async fn assessment_config_errors() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 3).await;

    let cases = [
        serde_json::json!({ "totalQuestions": 0, "rangeFrom": 1, "rangeTo": 3 }),
        serde_json::json!({ "totalQuestions": 1, "rangeFrom": 0, "rangeTo": 3 }),
        serde_json::json!({ "totalQuestions": 1, "rangeFrom": 3, "rangeTo": 2 }),
        serde_json::json!({ "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 4 }),
        // A time limit beyond the one-week cap must be rejected up front,
        // not persisted for the countdown math to choke on later.
        serde_json::json!({
            "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 3, "timeLimit": i64::MAX
        }),
        serde_json::json!({
            "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 3, "timeLimit": 10_081
        }),
    ];
    for config in cases {
        let response = client
            .post(format!("{}/api/quizzes/{}/assessments", address, quiz_id))
            .json(&config)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "config: {}", config);
    }

    // An empty pool selects nothing: there is no assessment to begin.
    let empty_quiz: serde_json::Value = client
        .post(format!("{}/api/quizzes", address))
        .json(&serde_json::json!({ "title": "Empty" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let response = client
        .post(format!(
            "{}/api/quizzes/{}/assessments",
            address,
            empty_quiz["id"].as_str().unwrap()
        ))
        .json(&serde_json::json!({ "totalQuestions": 1, "rangeFrom": 1, "rangeTo": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn failed_result_write_leaves_the_assessment_submittable() {
    let (address, state) = spawn_app_with_state().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 2).await;

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 2, "rangeFrom": 1, "rangeTo": 2, "randomize": false
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();

    answer(&client, &address, assessment_id, 0, 1, "choose").await;
    answer(&client, &address, assessment_id, 1, 1, "choose").await;

    // Break the result write mid-submission.
    sqlx::query("ALTER TABLE results RENAME TO results_unavailable")
        .execute(&state.pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    // The finished claim rolled back with the insert and the answers were
    // not drained, so a retry after the fault clears succeeds normally.
    sqlx::query("ALTER TABLE results_unavailable RENAME TO results")
        .execute(&state.pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/assessments/{}/submit", address, assessment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 100);
}

#[tokio::test]
async fn answer_events_validate_slot_and_option_bounds() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&client, &address, 2).await;

    let assessment = begin_assessment(
        &client,
        &address,
        &quiz_id,
        serde_json::json!({
            "totalQuestions": 2, "rangeFrom": 1, "rangeTo": 2, "randomize": false
        }),
    )
    .await;
    let assessment_id = assessment["id"].as_str().unwrap();

    let response = answer(&client, &address, assessment_id, 5, 0, "choose").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = answer(&client, &address, assessment_id, 0, 9, "choose").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = answer(&client, &address, "a-00000000", 0, 0, "choose").await;
    assert_eq!(response.status().as_u16(), 404);
}
