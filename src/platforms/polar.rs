use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::BountydError;
use crate::models::bounty::Bounty;

/// Client for the Polar funded-issue API. Only open bounties are listed.
pub struct PolarClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PolarClient {
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
        debug!("Fetching bounties from Polar API");

        let mut request = self
            .client
            .get(format!("{}/api/v1/bounties?state=open", self.base_url));
        if let Some(key) = &self.api_key {
            request = request
                .header("Authorization", format!("Bearer {}", key))
                .header("X-API-Key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| BountydError::Network(format!("Polar API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(BountydError::RateLimit("Polar rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(BountydError::Authentication("Invalid Polar API key".into()));
        }
        if !status.is_success() {
            return Err(BountydError::Network(format!(
                "Polar API returned {}",
                status
            )));
        }

        let root: Value = resp.json().await.map_err(|e| {
            BountydError::Network(format!("Failed to parse Polar API response: {}", e))
        })?;

        let Some(nodes) = root.get("items").and_then(Value::as_array) else {
            warn!("Invalid response format from Polar API");
            return Ok(Vec::new());
        };

        let mut bounties = Vec::new();
        for node in nodes {
            if let Some(bounty) = parse_bounty(node) {
                bounties.push(bounty);
            }
        }

        debug!(count = bounties.len(), "Fetched Polar bounties");
        Ok(bounties)
    }
}

fn parse_bounty(node: &Value) -> Option<Bounty> {
    let Some(issue) = node.get("issue") else {
        warn!("Bounty missing issue node");
        return None;
    };

    let reward = node.get("reward");
    let Some(reward_amount) = reward.and_then(|reward| reward.get("amount")) else {
        debug!("Skipping bounty without reward amount");
        return None;
    };

    let Some(repository_url) = issue
        .get("repository")
        .and_then(|repository| repository.get("url"))
        .and_then(text_value)
    else {
        warn!("Bounty missing repository URL");
        return None;
    };

    let (Some(issue_id), Some(amount_cents)) = (
        issue.get("id").and_then(text_value),
        dollars_to_cents(reward_amount),
    ) else {
        warn!(entry = %node, "Failed to parse bounty");
        return None;
    };

    let currency = reward
        .and_then(|reward| reward.get("currency"))
        .and_then(text_value)
        .unwrap_or_else(|| "USD".to_string());

    let mut bounty = Bounty::new(&issue_id, &repository_url, "polar")
        .with_amount_cents(amount_cents)
        .with_currency(&currency);

    if let Some(title) = issue.get("title").and_then(text_value) {
        bounty = bounty.with_title(&title);
    }
    if let Some(body) = issue.get("body").and_then(text_value) {
        bounty = bounty.with_description(&body);
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

fn dollars_to_cents(value: &Value) -> Option<i64> {
    let dollars = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some((dollars * 100.0).round() as i64)
}
