pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gamification;
pub mod handlers;
pub mod paths;
pub mod scoring;
pub mod session;
pub mod state;
pub mod submission;

#[cfg(test)]
pub mod testing;

use axum::{routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router over the given state
pub fn app(state: AppState) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/tests", get(handlers::list_tests))
    .route("/tests/{test_id}/attempts", post(handlers::start_attempt))
    .route("/attempts/{id}", get(handlers::get_attempt))
    .route("/attempts/{id}/answer", post(handlers::answer_question))
    .route("/attempts/{id}/mark", post(handlers::mark_question))
    .route("/attempts/{id}/next", post(handlers::next_question))
    .route("/attempts/{id}/previous", post(handlers::previous_question))
    .route("/attempts/{id}/submit", post(handlers::submit_attempt))
    .route("/results/{id}", get(handlers::get_results))
    .route("/results/{id}/review", get(handlers::get_review))
    .route("/practice", post(handlers::start_practice))
    .route("/practice/{id}", get(handlers::get_practice))
    .route("/practice/{id}/answer", post(handlers::answer_practice))
    .route("/practice/{id}/next", post(handlers::next_practice))
    .route("/practice/{id}/previous", post(handlers::previous_practice))
    .route("/practice/{id}/finish", post(handlers::finish_practice))
    .route("/me/stats", get(handlers::my_stats))
    .route("/achievements", get(handlers::list_achievements))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
