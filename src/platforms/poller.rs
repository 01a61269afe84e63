use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{with_retry, BountydError, RetryConfig};
use crate::models::bounty::Bounty;
use crate::triage::{AdmissionOutcome, TriageService};

use super::algora::AlgoraClient;
use super::polar::PolarClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(30);

/// Periodically pulls open bounties from the listing platforms and runs
/// each through the same admission sequence the webhook intake uses.
pub struct PlatformPoller {
    algora: AlgoraClient,
    polar: PolarClient,
    triage: Arc<TriageService>,
    interval: Duration,
    initial_delay: Duration,
}

impl PlatformPoller {
    pub fn new(algora: AlgoraClient, polar: PolarClient, triage: Arc<TriageService>) -> Self {
        Self {
            algora,
            polar,
            triage,
            interval: DEFAULT_POLL_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Platform poller started"
        );
        if Self::wait(self.initial_delay, &shutdown).await {
            return;
        }

        loop {
            info!("Starting scheduled bounty polling from all platforms");
            let admitted = self.poll_all_platforms().await;
            info!(admitted, "Scheduled bounty polling completed");

            if Self::wait(self.interval, &shutdown).await {
                break;
            }
        }

        info!("Platform poller stopped");
    }

    async fn wait(delay: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }

    /// One polling cycle. Returns how many bounties were admitted.
    pub async fn poll_all_platforms(&self) -> usize {
        debug!("Polling all platforms for new bounties");

        let retry = RetryConfig::default();
        let (algora, polar) = tokio::join!(
            with_retry("Algora fetch", &retry, || self.algora.fetch_bounties()),
            with_retry("Polar fetch", &retry, || self.polar.fetch_bounties()),
        );

        let mut admitted = 0;
        admitted += self.admit_all("algora", algora).await;
        admitted += self.admit_all("polar", polar).await;
        admitted
    }

    /// A failed fetch skips the platform for this cycle; the other
    /// platform's results are still admitted.
    async fn admit_all(
        &self,
        platform: &str,
        fetched: Result<Vec<Bounty>, BountydError>,
    ) -> usize {
        let bounties = match fetched {
            Ok(bounties) => bounties,
            Err(e) => {
                error!(platform, error = %e, "Error fetching bounties");
                return 0;
            }
        };

        let mut admitted = 0;
        for bounty in bounties {
            let issue_id = bounty.issue_id.clone();
            match self.triage.admit(bounty).await {
                Ok(AdmissionOutcome::Accepted { .. }) => admitted += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(platform, issue_id = %issue_id, error = %e, "Failed to admit polled bounty")
                }
            }
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::oracle::{AssessmentProvider, AssessmentResponse};
    use crate::triage::{AdmissionFilter, TriageQueue};
    use async_trait::async_trait;

    struct AcceptAll;

    #[async_trait]
    impl AssessmentProvider for AcceptAll {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
        ) -> Result<AssessmentResponse, BountydError> {
            Ok(AssessmentResponse {
                content: r#"{"shouldProcess": true, "confidence": 0.9, "estimatedTimeMinutes": 30, "reason": "straightforward"}"#.to_string(),
                input_tokens: None,
                output_tokens: None,
                model: "test".to_string(),
            })
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        fn model_name(&self) -> &str {
            "test"
        }
    }

    fn test_poller(db: &Database) -> PlatformPoller {
        let filter = AdmissionFilter::new(Arc::new(AcceptAll));
        let service = TriageService::new(db.clone(), TriageQueue::new(db.clone()), filter);
        PlatformPoller::new(
            AlgoraClient::new("http://localhost:1"),
            PolarClient::new("http://localhost:1"),
            Arc::new(service),
        )
    }

    #[tokio::test]
    async fn test_admit_all_persists_accepted_bounties() {
        let db = Database::in_memory().unwrap();
        let poller = test_poller(&db);

        let bounties = vec![
            Bounty::new("a-1", "https://github.com/o/r", "algora").with_amount_cents(10_000),
            Bounty::new("a-2", "https://github.com/o/r", "algora").with_amount_cents(12_000),
        ];

        let admitted = poller.admit_all("algora", Ok(bounties)).await;
        assert_eq!(admitted, 2);
        assert!(db.exists_by_issue_and_platform("a-1", "algora").unwrap());
        assert!(db.exists_by_issue_and_platform("a-2", "algora").unwrap());
    }

    #[tokio::test]
    async fn test_admit_all_counts_only_accepted() {
        let db = Database::in_memory().unwrap();
        let poller = test_poller(&db);

        // Second entry is under the minimum amount and gets rejected.
        let bounties = vec![
            Bounty::new("p-1", "https://github.com/o/r", "polar").with_amount_cents(10_000),
            Bounty::new("p-2", "https://github.com/o/r", "polar").with_amount_cents(500),
        ];

        let admitted = poller.admit_all("polar", Ok(bounties)).await;
        assert_eq!(admitted, 1);
        assert!(!db.exists_by_issue_and_platform("p-2", "polar").unwrap());
    }

    #[tokio::test]
    async fn test_admit_all_skips_duplicates_across_cycles() {
        let db = Database::in_memory().unwrap();
        let poller = test_poller(&db);

        let bounty =
            Bounty::new("a-9", "https://github.com/o/r", "algora").with_amount_cents(10_000);
        assert_eq!(poller.admit_all("algora", Ok(vec![bounty.clone()])).await, 1);
        assert_eq!(poller.admit_all("algora", Ok(vec![bounty])).await, 0);
    }

    #[tokio::test]
    async fn test_admit_all_swallows_fetch_errors() {
        let db = Database::in_memory().unwrap();
        let poller = test_poller(&db);

        let admitted = poller
            .admit_all("polar", Err(BountydError::Network("connection refused".into())))
            .await;
        assert_eq!(admitted, 0);
    }
}
