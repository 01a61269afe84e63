use axum::{body::Bytes, extract::State, http::StatusCode};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::webhook::normalizer::{self, Normalized};

/// Accepts CVE notifications from monitoring services. Field naming
/// varies by sender; the normalizer resolves the aliases.
pub async fn handle_cve_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, String) {
    info!("Received CVE webhook notification");

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed CVE payload");
            return (
                StatusCode::BAD_REQUEST,
                format!("Error processing webhook: {}", e),
            );
        }
    };

    let cve = match normalizer::normalize_cve(&payload) {
        Normalized::Cve(cve) => cve,
        Normalized::Discarded { reason } => {
            warn!(%reason, "Invalid CVE webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid payload: {}", reason),
            );
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "Invalid payload: missing cveId".to_string(),
            )
        }
    };

    info!(cve_id = %cve.cve_id, "Processing CVE webhook");
    match state.cve_monitor.handle_webhook(&cve) {
        Ok(_) => (
            StatusCode::OK,
            "CVE webhook processed successfully".to_string(),
        ),
        Err(e) => {
            error!(cve_id = %cve.cve_id, error = %e, "Error processing CVE webhook");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing webhook: {}", e),
            )
        }
    }
}

pub async fn health() -> &'static str {
    "CVE webhook endpoint is active"
}
