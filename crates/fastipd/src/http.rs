//! Manual trigger and status page
//!
//! - `GET /` plain-text status: what is synced, on what schedule, last result
//! - `GET /trigger` runs the job now and answers with the outcome

use crate::runner::{Runner, Trigger};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use std::fmt::Write as _;
use std::sync::Arc;

/// Build the router
pub fn router(runner: Arc<Runner>) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/trigger", get(trigger))
        .with_state(runner)
}

async fn trigger(State(runner): State<Arc<Runner>>) -> (StatusCode, String) {
    let report = runner.run(Trigger::Manual).await;

    let status = if report.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, format!("Manual trigger executed: {}\n", report.summary()))
}

async fn status_page(State(runner): State<Arc<Runner>>) -> String {
    let config = runner.job().config();

    let mut page = String::new();
    let _ = writeln!(page, "fastip-sync");
    let _ = writeln!(page, "Status: Running");
    let _ = writeln!(page, "Source: {}", config.source_domain);
    let _ = writeln!(page, "Target: {}", config.target_domain);
    let _ = writeln!(page, "Schedule: every {}s", config.schedule.interval_secs);

    match runner.last_report().await {
        Some(report) => {
            let took = report.finished_at - report.started_at;
            let _ = writeln!(
                page,
                "Last run: {} ({}, {}ms) {}",
                report.finished_at.to_rfc3339(),
                report.trigger,
                took.num_milliseconds(),
                report.summary()
            );
        }
        None => {
            let _ = writeln!(page, "Last run: none yet");
        }
    }

    let _ = writeln!(page, "Usage: GET /trigger");
    page
}
