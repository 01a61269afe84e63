pub mod routes;
pub mod errors;

use std::sync::Arc;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::cve::CveMonitor;
use crate::db::Database;
use crate::triage::{TriageDispatcher, TriageQueue};
use crate::webhook::SignatureVerifier;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub verifier: Arc<SignatureVerifier>,
    pub dispatcher: TriageDispatcher,
    pub cve_monitor: Arc<CveMonitor>,
    pub queue: TriageQueue,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", axum::routing::get(routes::health::health_check))
        .route("/api/webhooks/github", axum::routing::post(routes::github::handle_webhook))
        .route("/api/webhooks/github/issues", axum::routing::post(routes::github::handle_issue_event))
        .route("/api/webhooks/github/push", axum::routing::post(routes::github::handle_push_event))
        .route("/api/webhooks/github/ping", axum::routing::post(routes::github::handle_ping))
        .route("/api/webhooks/github/health", axum::routing::get(routes::github::health))
        .route("/api/webhooks/cve", axum::routing::post(routes::cve::handle_cve_webhook))
        .route("/api/webhooks/cve/health", axum::routing::get(routes::cve::health))
        .route("/api/bounties", axum::routing::get(routes::bounties::list_bounties))
        .route("/api/bounties/{id}", axum::routing::get(routes::bounties::get_bounty))
        .route("/api/stats", axum::routing::get(routes::bounties::get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
