use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::errors::BountydError;
use crate::models::bounty::Bounty;
use crate::oracle::AssessmentProvider;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_MAX_TIME_MINUTES: u32 = 60;
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one admission decision. `accepted == false` is a business
/// outcome, not an error; the pipeline never retries a rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub accepted: bool,
    pub confidence: f64,
    pub estimated_time_minutes: u32,
    pub reason: String,
}

impl FilterResult {
    /// The fail-safe outcome: zero confidence, zero estimate.
    pub fn rejected(reason: impl Into<String>) -> Self {
        FilterResult {
            accepted: false,
            confidence: 0.0,
            estimated_time_minutes: 0,
            reason: reason.into(),
        }
    }
}

/// The JSON object the oracle is instructed to reply with.
#[derive(Debug, Deserialize)]
struct Assessment {
    #[serde(rename = "shouldProcess")]
    should_process: bool,
    confidence: f64,
    #[serde(rename = "estimatedTimeMinutes")]
    estimated_time_minutes: u32,
    #[serde(default)]
    reason: String,
}

/// Decides whether a candidate is admitted to the processing queue by
/// consulting the assessment oracle and applying numeric thresholds.
/// Every failure mode (network, timeout, unparseable reply) rejects;
/// admission never fails open.
pub struct AdmissionFilter {
    oracle: Arc<dyn AssessmentProvider>,
    min_confidence: f64,
    max_time_minutes: u32,
    oracle_timeout: Duration,
}

impl AdmissionFilter {
    pub fn new(oracle: Arc<dyn AssessmentProvider>) -> Self {
        Self {
            oracle,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_time_minutes: DEFAULT_MAX_TIME_MINUTES,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_thresholds(mut self, min_confidence: f64, max_time_minutes: u32) -> Self {
        self.min_confidence = min_confidence;
        self.max_time_minutes = max_time_minutes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub async fn decide(&self, bounty: &Bounty) -> FilterResult {
        debug!(issue_id = %bounty.issue_id, title = ?bounty.title, "Filtering bounty");

        let prompt = build_prompt(bounty, self.max_time_minutes);
        let call = self.oracle.complete(&prompt, None);
        let response = match tokio::time::timeout(self.oracle_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(issue_id = %bounty.issue_id, error = %e, "Assessment call failed");
                return FilterResult::rejected(format!("Error during filtering: {}", e));
            }
            Err(_) => {
                error!(
                    issue_id = %bounty.issue_id,
                    timeout_secs = self.oracle_timeout.as_secs(),
                    "Assessment call timed out"
                );
                return FilterResult::rejected("Assessment call timed out");
            }
        };

        let assessment = match parse_assessment(&response.content) {
            Ok(assessment) => assessment,
            Err(e) => {
                error!(issue_id = %bounty.issue_id, error = %e, "Unparseable assessment response");
                return FilterResult::rejected("Failed to parse assessment response");
            }
        };

        if assessment.confidence < self.min_confidence {
            debug!(
                issue_id = %bounty.issue_id,
                confidence = assessment.confidence,
                threshold = self.min_confidence,
                "Bounty rejected: confidence below threshold"
            );
            return FilterResult {
                accepted: false,
                confidence: assessment.confidence,
                estimated_time_minutes: assessment.estimated_time_minutes,
                reason: format!("{} (confidence too low)", assessment.reason),
            };
        }

        if assessment.estimated_time_minutes > self.max_time_minutes {
            debug!(
                issue_id = %bounty.issue_id,
                estimated_minutes = assessment.estimated_time_minutes,
                threshold = self.max_time_minutes,
                "Bounty rejected: time estimate above threshold"
            );
            return FilterResult {
                accepted: false,
                confidence: assessment.confidence,
                estimated_time_minutes: assessment.estimated_time_minutes,
                reason: format!("{} (time estimate too high)", assessment.reason),
            };
        }

        if assessment.should_process {
            info!(
                issue_id = %bounty.issue_id,
                confidence = assessment.confidence,
                estimated_minutes = assessment.estimated_time_minutes,
                "Bounty accepted by admission filter"
            );
        }

        FilterResult {
            accepted: assessment.should_process,
            confidence: assessment.confidence,
            estimated_time_minutes: assessment.estimated_time_minutes,
            reason: assessment.reason,
        }
    }
}

/// Missing fields render as "N/A" so the oracle never sees an ambiguous
/// blank.
fn build_prompt(bounty: &Bounty, max_time_minutes: u32) -> String {
    let amount = bounty
        .amount_dollars()
        .map(|dollars| format!("{:.2}", dollars))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Analyze this bug bounty and decide whether it is worth automated remediation effort.\n\
         \n\
         We only want small, clearly described fixes that one worker can land quickly: a single\n\
         file, no proof-of-concept required, no architectural work. When in doubt, reject.\n\
         \n\
         Bounty details:\n\
         - Issue ID: {}\n\
         - Repository: {}\n\
         - Platform: {}\n\
         - Amount: {} {}\n\
         - Title: {}\n\
         - Description: {}\n\
         \n\
         The fix must be achievable in under {} minutes.\n\
         \n\
         Respond with a JSON object:\n\
         {{\n\
           \"shouldProcess\": true/false,\n\
           \"confidence\": 0.0-1.0,\n\
           \"estimatedTimeMinutes\": number,\n\
           \"reason\": \"brief explanation\"\n\
         }}",
        bounty.issue_id,
        bounty.repository_url,
        bounty.platform,
        amount,
        bounty.currency.as_deref().unwrap_or("USD"),
        bounty.title.as_deref().unwrap_or("N/A"),
        bounty.description.as_deref().unwrap_or("N/A"),
        max_time_minutes,
    )
}

fn parse_assessment(content: &str) -> Result<Assessment, BountydError> {
    let value = extract_json(content)?;
    serde_json::from_value(value)
        .map_err(|e| BountydError::Assessment(format!("Assessment missing required fields: {}", e)))
}

fn extract_json(text: &str) -> Result<Value, BountydError> {
    // Try direct parse first
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Ok(v);
    }
    // Try extracting from markdown code block
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            let json_str = rest[..end].trim();
            return serde_json::from_str(json_str)
                .map_err(|e| BountydError::Assessment(format!("Invalid JSON in code block: {}", e)));
        }
    }
    // Try finding first { to last }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let json_str = &text[start..=end];
            return serde_json::from_str(json_str)
                .map_err(|e| BountydError::Assessment(format!("Invalid JSON extraction: {}", e)));
        }
    }
    Err(BountydError::Assessment("No valid JSON found in assessment response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::AssessmentResponse;
    use async_trait::async_trait;

    enum MockReply {
        Content(String),
        Fail,
        Hang,
    }

    struct MockOracle {
        reply: MockReply,
    }

    impl MockOracle {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self { reply: MockReply::Content(content.to_string()) })
        }

        fn assessment(should_process: bool, confidence: f64, minutes: u32, reason: &str) -> Arc<Self> {
            Self::replying(
                &serde_json::json!({
                    "shouldProcess": should_process,
                    "confidence": confidence,
                    "estimatedTimeMinutes": minutes,
                    "reason": reason
                })
                .to_string(),
            )
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: MockReply::Fail })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self { reply: MockReply::Hang })
        }
    }

    #[async_trait]
    impl AssessmentProvider for MockOracle {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
        ) -> Result<AssessmentResponse, BountydError> {
            match &self.reply {
                MockReply::Content(content) => Ok(AssessmentResponse {
                    content: content.clone(),
                    input_tokens: Some(100),
                    output_tokens: Some(50),
                    model: "mock".to_string(),
                }),
                MockReply::Fail => Err(BountydError::Network("connection refused".into())),
                MockReply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }

        fn provider_name(&self) -> &str {
            "mock"
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn bounty() -> Bounty {
        Bounty::new("42", "https://github.com/acme/widget", "github")
            .with_amount_cents(10_000)
            .with_currency("USD")
            .with_title("Fix typo in error message")
    }

    #[tokio::test]
    async fn test_low_confidence_rejected_regardless_of_time() {
        let filter = AdmissionFilter::new(MockOracle::assessment(true, 0.5, 5, "looks trivial"));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.confidence, 0.5);
        assert!(result.reason.ends_with("(confidence too low)"));
    }

    #[tokio::test]
    async fn test_high_time_estimate_rejected_citing_time() {
        let filter = AdmissionFilter::new(MockOracle::assessment(true, 0.9, 90, "doable"));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.estimated_time_minutes, 90);
        assert!(result.reason.contains("time estimate too high"));
        assert!(!result.reason.contains("confidence too low"));
    }

    #[tokio::test]
    async fn test_passing_thresholds_accepts_with_oracle_reason() {
        let filter = AdmissionFilter::new(MockOracle::assessment(true, 0.95, 20, "one-line fix"));
        let result = filter.decide(&bounty()).await;

        assert!(result.accepted);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.estimated_time_minutes, 20);
        assert_eq!(result.reason, "one-line fix");
    }

    #[tokio::test]
    async fn test_oracle_recommendation_against_is_preserved() {
        let filter = AdmissionFilter::new(MockOracle::assessment(false, 0.9, 10, "needs a POC"));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.reason, "needs a POC");
    }

    #[tokio::test]
    async fn test_oracle_error_fails_safe() {
        let filter = AdmissionFilter::new(MockOracle::failing());
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.estimated_time_minutes, 0);
    }

    #[tokio::test]
    async fn test_unparseable_response_fails_safe() {
        let filter = AdmissionFilter::new(MockOracle::replying("I think you should go for it!"));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.estimated_time_minutes, 0);
    }

    #[tokio::test]
    async fn test_missing_fields_fail_safe() {
        let filter = AdmissionFilter::new(MockOracle::replying(r#"{"confidence": 0.9}"#));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_fenced_response_is_parsed() {
        let content = "Here is my analysis:\n```json\n{\"shouldProcess\": true, \"confidence\": 0.9, \"estimatedTimeMinutes\": 15, \"reason\": \"simple\"}\n```\nGood luck!";
        let filter = AdmissionFilter::new(MockOracle::replying(content));
        let result = filter.decide(&bounty()).await;

        assert!(result.accepted);
        assert_eq!(result.reason, "simple");
    }

    #[tokio::test]
    async fn test_oracle_timeout_fails_safe() {
        let filter =
            AdmissionFilter::new(MockOracle::hanging()).with_timeout(Duration::from_millis(20));
        let result = filter.decide(&bounty()).await;

        assert!(!result.accepted);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_custom_thresholds() {
        let filter = AdmissionFilter::new(MockOracle::assessment(true, 0.7, 100, "fine"))
            .with_thresholds(0.65, 120);
        let result = filter.decide(&bounty()).await;
        assert!(result.accepted);
    }

    #[test]
    fn test_prompt_renders_missing_fields_as_na() {
        let bare = Bounty::new("7", "https://github.com/acme/widget", "github");
        let prompt = build_prompt(&bare, 60);

        assert!(prompt.contains("Amount: N/A USD"));
        assert!(prompt.contains("Title: N/A"));
        assert!(prompt.contains("Description: N/A"));
        assert!(prompt.contains("under 60 minutes"));
    }

    #[test]
    fn test_prompt_renders_amounts_exactly() {
        let prompt = build_prompt(&bounty(), 60);
        assert!(prompt.contains("Amount: 100.00 USD"));
    }

    #[test]
    fn test_extract_json_direct_and_braces() {
        assert!(extract_json(r#"{"a": 1}"#).is_ok());
        assert!(extract_json("noise before {\"a\": 1} noise after").is_ok());
        assert!(extract_json("no json here").is_err());
    }
}
