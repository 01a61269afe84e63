use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, error, info, warn};

use crate::api::AppState;
use crate::webhook::normalizer::{self, Normalized};
use crate::webhook::{IssueEvent, PushEvent};

const GITHUB_EVENT_HEADER: &str = "X-GitHub-Event";
const GITHUB_SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
const GITHUB_DELIVERY_HEADER: &str = "X-GitHub-Delivery";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Primary endpoint for real-time bounty detection.
pub async fn handle_issue_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let event_type = header(&headers, GITHUB_EVENT_HEADER);
    let delivery_id = header(&headers, GITHUB_DELIVERY_HEADER);
    debug!(event_type, delivery_id, "Received webhook event");

    if event_type != Some("issues") {
        warn!(event_type, "Received non-issues event");
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "Expected 'issues' event, received: {}",
                event_type.unwrap_or("none")
            ),
        );
    }

    if !state
        .verifier
        .verify(&body, header(&headers, GITHUB_SIGNATURE_HEADER))
    {
        warn!(delivery_id, "Invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    }

    process_issue_payload(&state, &body, delivery_id).await
}

pub async fn handle_push_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let event_type = header(&headers, GITHUB_EVENT_HEADER);
    let delivery_id = header(&headers, GITHUB_DELIVERY_HEADER);
    debug!(event_type, delivery_id, "Received webhook event");

    if event_type != Some("push") {
        warn!(event_type, "Received non-push event");
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "Expected 'push' event, received: {}",
                event_type.unwrap_or("none")
            ),
        );
    }

    if !state
        .verifier
        .verify(&body, header(&headers, GITHUB_SIGNATURE_HEADER))
    {
        warn!(delivery_id, "Invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    }

    process_push_payload(&body, delivery_id)
}

/// Unified endpoint. GitHub can be configured to send every event here;
/// the event-type header picks the handler.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let event_type = header(&headers, GITHUB_EVENT_HEADER);
    let delivery_id = header(&headers, GITHUB_DELIVERY_HEADER);
    debug!(event_type, delivery_id, "Received webhook event");

    if !state
        .verifier
        .verify(&body, header(&headers, GITHUB_SIGNATURE_HEADER))
    {
        warn!(delivery_id, "Invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    }

    match event_type {
        Some("issues") => process_issue_payload(&state, &body, delivery_id).await,
        Some("push") => process_push_payload(&body, delivery_id),
        Some("ping") => {
            info!(delivery_id, "Received ping event from GitHub");
            (StatusCode::OK, "Pong".to_string())
        }
        other => {
            debug!(event_type = other, delivery_id, "Unhandled event type");
            (StatusCode::OK, "Event received but not processed".to_string())
        }
    }
}

/// Webhook test endpoint. The signature is verified even for pings.
pub async fn handle_ping(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let delivery_id = header(&headers, GITHUB_DELIVERY_HEADER);
    info!(delivery_id, "Received ping event from GitHub");

    if !state
        .verifier
        .verify(&body, header(&headers, GITHUB_SIGNATURE_HEADER))
    {
        warn!(delivery_id, "Invalid signature for ping event");
        return (StatusCode::UNAUTHORIZED, "Invalid signature".to_string());
    }

    (StatusCode::OK, "Pong".to_string())
}

pub async fn health() -> &'static str {
    "GitHub webhook endpoint is active"
}

async fn process_issue_payload(
    state: &AppState,
    body: &[u8],
    delivery_id: Option<&str>,
) -> (StatusCode, String) {
    let event: IssueEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(delivery_id, error = %e, "Malformed issue payload");
            return (
                StatusCode::BAD_REQUEST,
                format!("Error processing webhook: {}", e),
            );
        }
    };

    info!(
        action = %event.action,
        repository = %event.repository.full_name,
        issue = event.issue.number,
        delivery_id,
        "Processing issue event"
    );

    match normalizer::normalize_issue(&event) {
        Normalized::Candidate(bounty) => match state.dispatcher.submit(bounty).await {
            Ok(()) => (
                StatusCode::OK,
                "Webhook processed successfully".to_string(),
            ),
            Err(e) => {
                error!(delivery_id, error = %e, "Failed to hand off candidate");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process webhook".to_string(),
                )
            }
        },
        Normalized::Discarded { reason } => {
            debug!(delivery_id, %reason, "Issue event discarded");
            (
                StatusCode::OK,
                "Webhook processed successfully".to_string(),
            )
        }
        _ => (
            StatusCode::OK,
            "Webhook processed successfully".to_string(),
        ),
    }
}

fn process_push_payload(body: &[u8], delivery_id: Option<&str>) -> (StatusCode, String) {
    let event: PushEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(delivery_id, error = %e, "Malformed push payload");
            return (
                StatusCode::BAD_REQUEST,
                format!("Error processing webhook: {}", e),
            );
        }
    };

    info!(
        repository = %event.repository.full_name,
        delivery_id,
        "Processing push event"
    );

    if let Normalized::RepositoryTouched {
        repository_url,
        branch,
        default_branch,
        commit_count,
        ..
    } = normalizer::normalize_push(&event)
    {
        info!(
            %repository_url,
            branch = ?branch,
            default_branch,
            commit_count,
            "Repository touched"
        );
    }

    (StatusCode::OK, "Webhook processed successfully".to_string())
}
