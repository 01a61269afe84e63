use crate::errors::BountydError;
use super::provider::AssessmentProvider;
use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;

pub fn create_provider(
    provider_name: &str,
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn AssessmentProvider>, BountydError> {
    match provider_name {
        "anthropic" => Ok(match base_url {
            Some(url) => Box::new(AnthropicProvider::with_base_url(api_key, model, url)),
            None => Box::new(AnthropicProvider::new(api_key, model)),
        }),
        "openai" => Ok(match base_url {
            Some(url) => Box::new(OpenAIProvider::with_base_url(api_key, model, url)),
            None => Box::new(OpenAIProvider::new(api_key, model)),
        }),
        _ => Err(BountydError::Config(format!(
            "Unknown assessment provider: {}",
            provider_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        let anthropic = create_provider("anthropic", "key", None, None).unwrap();
        assert_eq!(anthropic.provider_name(), "anthropic");
        assert_eq!(anthropic.model_name(), "claude-sonnet-4-5-20250929");

        let openai = create_provider("openai", "key", Some("gpt-4o-mini"), None).unwrap();
        assert_eq!(openai.provider_name(), "openai");
        assert_eq!(openai.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let result = create_provider("carrier-pigeon", "key", None, None);
        assert!(matches!(result, Err(BountydError::Config(_))));
    }
}
