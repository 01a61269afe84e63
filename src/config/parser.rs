use std::path::Path;

use crate::errors::BountydError;
use super::types::BountydConfig;

pub async fn parse_config(path: &Path) -> Result<BountydConfig, BountydError> {
    if !path.exists() {
        return Err(BountydError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(BountydError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: BountydConfig = serde_yaml::from_str(&content)?;

    validate_semantics(&config)?;

    Ok(config)
}

/// Range and consistency checks that serde cannot express.
fn validate_semantics(config: &BountydConfig) -> Result<(), BountydError> {
    let min_confidence = config.min_confidence();
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(BountydError::Config(format!(
            "triage.min_confidence must be within [0.0, 1.0], got {}",
            min_confidence
        )));
    }

    let minimum = config.minimum_amount_cents();
    let maximum = config.maximum_amount_cents();
    if minimum < 0 || maximum < 0 {
        return Err(BountydError::Config(
            "triage amount limits must be non-negative".into(),
        ));
    }
    if minimum > maximum {
        return Err(BountydError::Config(format!(
            "triage.minimum_amount_cents ({}) exceeds maximum_amount_cents ({})",
            minimum, maximum
        )));
    }

    if config.queue_key().is_empty() {
        return Err(BountydError::Config("triage.queue_key must not be empty".into()));
    }

    if config.dispatch_capacity() == 0 {
        return Err(BountydError::Config(
            "triage.dispatch_capacity must be at least 1".into(),
        ));
    }

    let provider = config.oracle_provider();
    if !matches!(provider.as_str(), "anthropic" | "openai") {
        return Err(BountydError::Config(format!(
            "Unknown assessment provider: {}",
            provider
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::TriageConfig;
    use std::io::Write;

    #[tokio::test]
    async fn test_parse_config_missing_file() {
        let err = parse_config(Path::new("/nonexistent/bountyd.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, BountydError::Config(_)));
    }

    #[tokio::test]
    async fn test_parse_config_valid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 9000\ntriage:\n  min_confidence: 0.7"
        )
        .unwrap();

        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.min_confidence(), 0.7);
    }

    #[tokio::test]
    async fn test_parse_config_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [unclosed").unwrap();
        let err = parse_config(file.path()).await.unwrap_err();
        assert!(matches!(err, BountydError::Yaml(_)));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let config = BountydConfig {
            triage: Some(TriageConfig {
                min_confidence: Some(1.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_semantics(&config).is_err());
    }

    #[test]
    fn test_inverted_amount_limits_rejected() {
        let config = BountydConfig {
            triage: Some(TriageConfig {
                minimum_amount_cents: Some(30_000),
                maximum_amount_cents: Some(10_000),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_semantics(&config).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_semantics(&BountydConfig::default()).is_ok());
    }
}
