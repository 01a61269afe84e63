use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::BountydError;
use crate::models::bounty::Bounty;
use super::service::TriageService;

pub const DEFAULT_DISPATCH_CAPACITY: usize = 64;
pub const DEFAULT_ACK_DEADLINE: Duration = Duration::from_millis(500);

/// Hands candidates from webhook handlers to a background admission task.
/// The handler path must answer within its deadline no matter how slow
/// the oracle is, so the only thing it does is a bounded-channel send.
#[derive(Clone)]
pub struct TriageDispatcher {
    tx: mpsc::Sender<Bounty>,
    ack_deadline: Duration,
}

impl TriageDispatcher {
    /// Queue a candidate for admission. Errs when the channel is full past
    /// the deadline or the admission task is gone; the caller surfaces
    /// that as a retryable server error to the webhook sender.
    pub async fn submit(&self, bounty: Bounty) -> Result<(), BountydError> {
        let issue_id = bounty.issue_id.clone();
        match self.tx.send_timeout(bounty, self.ack_deadline).await {
            Ok(()) => {
                debug!(issue_id = %issue_id, "Candidate dispatched for admission");
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => Err(BountydError::Queue(
                "Admission queue is full".to_string(),
            )),
            Err(SendTimeoutError::Closed(_)) => Err(BountydError::Queue(
                "Admission worker is not running".to_string(),
            )),
        }
    }
}

/// Spawn the admission task and return its dispatcher handle. The task
/// drains candidates until the channel closes or the token cancels.
pub fn spawn_admission_worker(
    service: Arc<TriageService>,
    capacity: usize,
    ack_deadline: Duration,
    shutdown: CancellationToken,
) -> (TriageDispatcher, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Bounty>(capacity);

    let handle = tokio::spawn(async move {
        loop {
            let bounty = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => match received {
                    Some(bounty) => bounty,
                    None => break,
                },
            };

            let issue_id = bounty.issue_id.clone();
            if let Err(e) = service.admit(bounty).await {
                warn!(issue_id = %issue_id, error = %e, "Admission attempt failed");
            }
        }
        debug!("Admission worker stopped");
    });

    (TriageDispatcher { tx, ack_deadline }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::bounty::Bounty;
    use crate::oracle::{AssessmentProvider, AssessmentResponse};
    use crate::triage::filter::AdmissionFilter;
    use crate::triage::queue::TriageQueue;
    use async_trait::async_trait;

    struct YesOracle;

    #[async_trait]
    impl AssessmentProvider for YesOracle {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
        ) -> Result<AssessmentResponse, BountydError> {
            Ok(AssessmentResponse {
                content: r#"{"shouldProcess": true, "confidence": 0.95, "estimatedTimeMinutes": 10, "reason": "ok"}"#.to_string(),
                input_tokens: None,
                output_tokens: None,
                model: "mock".to_string(),
            })
        }

        fn provider_name(&self) -> &str {
            "mock"
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn service(db: &Database) -> Arc<TriageService> {
        Arc::new(TriageService::new(
            db.clone(),
            TriageQueue::new(db.clone()),
            AdmissionFilter::new(Arc::new(YesOracle)),
        ))
    }

    #[tokio::test]
    async fn test_submitted_candidate_is_admitted() {
        let db = Database::in_memory().unwrap();
        let shutdown = CancellationToken::new();
        let (dispatcher, handle) =
            spawn_admission_worker(service(&db), 8, DEFAULT_ACK_DEADLINE, shutdown.clone());

        let bounty = Bounty::new("42", "https://github.com/acme/widget", "github")
            .with_amount_cents(10_000);
        let id = bounty.id;
        dispatcher.submit(bounty).await.unwrap();

        let stored = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(b) = db.get_bounty(&id).unwrap() {
                    return b;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("candidate was never persisted");
        assert_eq!(stored.issue_id, "42");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_errors() {
        let db = Database::in_memory().unwrap();
        let shutdown = CancellationToken::new();
        let (dispatcher, handle) =
            spawn_admission_worker(service(&db), 8, Duration::from_millis(50), shutdown.clone());

        shutdown.cancel();
        handle.await.unwrap();

        let bounty = Bounty::new("7", "https://github.com/acme/widget", "github")
            .with_amount_cents(10_000);
        let err = dispatcher.submit(bounty).await.unwrap_err();
        assert!(matches!(err, BountydError::Queue(_)));
    }
}
