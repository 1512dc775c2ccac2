// src/sweeper.rs

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{
    core::timer::{Countdown, CountdownState},
    error::AppError,
    handlers::assessment,
    models::assessment::Assessment,
    state::AppState,
};

/// Finalizes every timed, unfinished assessment whose deadline has
/// passed, grading whatever answers the session store has accumulated.
/// Unanswered questions keep empty selections and grade as incorrect;
/// the completeness gate applies only to manual submission.
pub async fn sweep_expired(state: &AppState) -> Result<usize, AppError> {
    let now = Utc::now();

    let candidates = sqlx::query_as::<_, Assessment>(
        r#"
        SELECT id, quiz_id, total_questions, range_from, range_to, randomize,
               time_limit, question_order, started_at, finished
        FROM assessments
        WHERE finished = 0 AND time_limit IS NOT NULL AND time_limit > 0
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let mut finalized = 0;
    for row in candidates {
        let countdown = Countdown::new(row.started_at, row.time_limit.unwrap_or(0));
        if countdown.state(now) != CountdownState::Expired {
            continue;
        }
        match assessment::finalize(state, &row, now).await {
            Ok(result) => {
                tracing::info!(
                    assessment = %row.id,
                    score = result.score,
                    "time limit expired, auto-submitted"
                );
                finalized += 1;
            }
            // A manual submission won the race; nothing left to do.
            Err(AppError::Conflict(_)) => {}
            Err(e) => {
                tracing::error!("Failed to finalize expired assessment {}: {}", row.id, e);
            }
        }
    }

    Ok(finalized)
}

/// Spawns the once-a-second expiry scan for the lifetime of the process.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval(Duration::from_secs(1));
        loop {
            tick.tick().await;
            if let Err(e) = sweep_expired(&state).await {
                tracing::error!("Expiry sweep failed: {}", e);
            }
        }
    })
}
