//! Route table and middleware stack.

use crate::domain::config::GatewayConfig;
use crate::handlers::{governance, system, voting};
use crate::middleware::{create_cors_layer, track_requests, GatewayMetrics};
use axum::routing::{delete, get, post, put};
use axum::Router;
use bg_governance::{GovernanceApi, GovernanceMetrics};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn GovernanceApi>,
    pub governance_metrics: Arc<GovernanceMetrics>,
    pub metrics: Arc<GatewayMetrics>,
}

/// Build the HTTP router.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.metrics),
            track_requests,
        ))
        .layer(TimeoutLayer::new(config.timeouts.request()))
        .layer(create_cors_layer(&config.cors));

    let api = Router::new()
        .route("/addReviewer", post(governance::add_reviewer))
        .route("/removeReviewer", delete(governance::remove_reviewer))
        .route("/listReviewers", get(governance::list_reviewers))
        .route("/addManager", post(governance::add_manager))
        .route("/changeManager", put(governance::change_manager))
        .route("/removeManager", delete(governance::remove_manager))
        .route("/getManager", get(governance::get_manager))
        .route(
            "/submissions/:submission_id/castReviewerVote",
            post(voting::cast_reviewer_vote),
        )
        .route(
            "/submissions/:submission_id/castManagerVote",
            post(voting::cast_manager_vote),
        )
        .route(
            "/submissions/:submission_id/finalize",
            post(voting::finalize_submission),
        )
        .route("/submissionStatus", get(voting::submission_status));

    Router::new()
        .nest("/api", api)
        .route("/health", get(system::health_check))
        .route("/metrics", get(system::metrics))
        .layer(middleware)
        .with_state(state)
}
