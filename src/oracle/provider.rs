use async_trait::async_trait;
use crate::errors::BountydError;
use super::types::AssessmentResponse;

/// The external assessment capability the admission filter consults.
/// Implementations wrap one model backend; the filter never sees the
/// transport.
#[async_trait]
pub trait AssessmentProvider: Send + Sync {
    /// Free-form text completion
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<AssessmentResponse, BountydError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}
