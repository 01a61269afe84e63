use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::BountydError;
use super::provider::AssessmentProvider;
use super::types::AssessmentResponse;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        let mut provider = Self::new(api_key, model);
        provider.base_url = base_url.trim_end_matches('/').to_string();
        provider
    }
}

#[async_trait]
impl AssessmentProvider for OpenAIProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<AssessmentResponse, BountydError> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": 1024,
        });

        let resp = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| BountydError::Network(format!("OpenAI request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(BountydError::RateLimit("OpenAI rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(BountydError::Authentication("Invalid OpenAI API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| BountydError::Assessment(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            if msg.contains("billing") || msg.contains("quota") {
                return Err(BountydError::Billing(msg.to_string()));
            }
            return Err(BountydError::Assessment(msg.to_string()));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| BountydError::Assessment("No content in OpenAI response".into()))?
            .to_string();
        let input_tokens = data["usage"]["prompt_tokens"].as_u64();
        let output_tokens = data["usage"]["completion_tokens"].as_u64();

        Ok(AssessmentResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "openai" }
    fn model_name(&self) -> &str { &self.model }
}
