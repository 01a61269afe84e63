use super::types::BountydError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl BountydError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Retryable errors
            BountydError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            BountydError::Billing(_) => ErrorClassification {
                error_type: "BillingError",
                retryable: true,
            },
            BountydError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            BountydError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            BountydError::Queue(_) => ErrorClassification {
                error_type: "QueueError",
                retryable: true,
            },
            BountydError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                retryable: true,
            },
            BountydError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },
            BountydError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: true,
            },

            // Non-retryable errors
            BountydError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            BountydError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            BountydError::Payload(_) => ErrorClassification {
                error_type: "PayloadError",
                retryable: false,
            },
            BountydError::NotFound(_) => ErrorClassification {
                error_type: "NotFoundError",
                retryable: false,
            },
            // Admission is fail-safe: a failed assessment rejects the
            // candidate, it is never replayed against the oracle.
            BountydError::Assessment(_) => ErrorClassification {
                error_type: "AssessmentError",
                retryable: false,
            },
            BountydError::Lifecycle(_) => ErrorClassification {
                error_type: "LifecycleError",
                retryable: false,
            },
            BountydError::Processing(_) => ErrorClassification {
                error_type: "ProcessingError",
                retryable: false,
            },
            BountydError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            BountydError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = BountydError::RateLimit("too many requests".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_queue_store_retryable() {
        let err = BountydError::Queue("store unavailable".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "QueueError");
    }

    #[test]
    fn test_database_retryable() {
        let err = BountydError::Database("locked".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = BountydError::Authentication("bad signature".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "AuthenticationError");
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = BountydError::Config("invalid config".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_assessment_not_retryable() {
        let err = BountydError::Assessment("oracle unreachable".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_payload_not_retryable() {
        let err = BountydError::Payload("missing cveId".into());
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_network_error_retryable() {
        let err = BountydError::Network("connection refused".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_timeout_retryable() {
        let err = BountydError::Timeout("timed out".into());
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_lifecycle_not_retryable() {
        let err = BountydError::Lifecycle("COMPLETED -> IN_PROGRESS".into());
        assert!(!err.classify().retryable);
    }
}
