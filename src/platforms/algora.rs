use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::BountydError;
use crate::models::bounty::Bounty;

/// Client for the Algora bounty listing API.
pub struct AlgoraClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlgoraClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        if !api_key.is_empty() {
            self.api_key = Some(api_key.to_string());
        }
        self
    }

    pub async fn fetch_bounties(&self) -> Result<Vec<Bounty>, BountydError> {
        debug!("Fetching bounties from Algora API");

        let mut request = self.client.get(format!("{}/v1/bounties", self.base_url));
        if let Some(key) = &self.api_key {
            request = request
                .header("Authorization", format!("Bearer {}", key))
                .header("X-API-Key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| BountydError::Network(format!("Algora API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(BountydError::RateLimit("Algora rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(BountydError::Authentication("Invalid Algora API key".into()));
        }
        if !status.is_success() {
            return Err(BountydError::Network(format!(
                "Algora API returned {}",
                status
            )));
        }

        let root: Value = resp.json().await.map_err(|e| {
            BountydError::Network(format!("Failed to parse Algora API response: {}", e))
        })?;

        let Some(nodes) = root.get("bounties").and_then(Value::as_array) else {
            warn!("Invalid response format from Algora API");
            return Ok(Vec::new());
        };

        let mut bounties = Vec::new();
        for node in nodes {
            match parse_bounty(node) {
                Some(bounty) => bounties.push(bounty),
                None => warn!(entry = %node, "Failed to parse bounty"),
            }
        }

        debug!(count = bounties.len(), "Fetched Algora bounties");
        Ok(bounties)
    }
}

/// An entry with a present but unparseable field is rejected whole;
/// absent optional fields are fine.
fn parse_bounty(node: &Value) -> Option<Bounty> {
    let issue_id = node.get("issueId").and_then(text_value)?;
    let repository_url = node.get("repositoryUrl").and_then(text_value)?;

    let mut bounty = Bounty::new(&issue_id, &repository_url, "algora");

    if let Some(amount) = node.get("amount") {
        bounty = bounty.with_amount_cents(dollars_to_cents(amount)?);
    }
    if let Some(currency) = node.get("currency").and_then(text_value) {
        bounty = bounty.with_currency(&currency);
    }
    if let Some(title) = node.get("title").and_then(text_value) {
        bounty = bounty.with_title(&title);
    }
    if let Some(description) = node.get("description").and_then(text_value) {
        bounty = bounty.with_description(&description);
    }

    Some(bounty)
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Platform APIs quote amounts as decimal dollars.
fn dollars_to_cents(value: &Value) -> Option<i64> {
    let dollars = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some((dollars * 100.0).round() as i64)
}
