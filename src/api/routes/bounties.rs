use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::AppState;
use crate::errors::BountydError;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_bounties(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, BountydError> {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let bounties = state.db.list_bounties(limit, offset)?;

    Ok(Json(json!({ "bounties": bounties, "total": bounties.len() })))
}

pub async fn get_bounty(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, BountydError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| BountydError::Payload("Invalid bounty id".to_string()))?;

    match state.db.get_bounty(&id)? {
        Some(bounty) => Ok(Json(json!(bounty))),
        None => Err(BountydError::NotFound(format!("Bounty {}", id))),
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, BountydError> {
    let counts = state.db.count_bounties_by_status()?;
    let queue_depth = state.queue.len()?;

    let mut by_status = serde_json::Map::new();
    let mut total = 0;
    for (status, count) in counts {
        total += count;
        by_status.insert(status, json!(count));
    }

    Ok(Json(json!({
        "total": total,
        "by_status": by_status,
        "queue_depth": queue_depth,
    })))
}
