use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::errors::BountydError;
use crate::models::bounty::Bounty;
use crate::triage::TriageQueue;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Downstream automation that turns a bounty into a pull request.
/// Returns the pull request identifier on success.
#[async_trait]
pub trait BountyProcessor: Send + Sync {
    async fn process(&self, bounty: &Bounty) -> Result<String, BountydError>;
}

/// Single consumer of the triage queue. Pops the highest-priority bounty,
/// drives it OPEN -> IN_PROGRESS -> COMPLETED/FAILED, and persists each
/// transition.
pub struct BountyWorker {
    db: Database,
    queue: TriageQueue,
    processor: Arc<dyn BountyProcessor>,
    poll_interval: Duration,
}

impl BountyWorker {
    pub fn new(db: Database, queue: TriageQueue, processor: Arc<dyn BountyProcessor>) -> Self {
        Self {
            db,
            queue,
            processor,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until the token cancels. A store failure on dequeue is backed
    /// off and retried; it is never conflated with an empty queue.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(poll_secs = self.poll_interval.as_secs(), "Bounty worker started");
        let mut store_failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.queue.dequeue() {
                Err(e) => {
                    let delay = e.classify().retry_delay(store_failures);
                    store_failures = store_failures.saturating_add(1);
                    warn!(
                        error = %e,
                        delay_secs = delay.as_secs(),
                        "Queue store unavailable, backing off"
                    );
                    if Self::wait(delay, &shutdown).await {
                        break;
                    }
                }
                Ok(None) => {
                    store_failures = 0;
                    if Self::wait(self.poll_interval, &shutdown).await {
                        break;
                    }
                }
                Ok(Some(bounty)) => {
                    store_failures = 0;
                    self.process_one(bounty).await;
                }
            }
        }

        info!("Bounty worker stopped");
    }

    /// Returns true if shutdown fired during the wait.
    async fn wait(delay: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }

    async fn process_one(&self, dequeued: Bounty) {
        // The queue payload is a snapshot from enqueue time. Reload the
        // live record and re-check eligibility: the bounty may have been
        // failed by an external path while it sat in the queue.
        let current = match self.db.get_bounty(&dequeued.id) {
            Ok(Some(bounty)) => bounty,
            Ok(None) => {
                warn!(bounty_id = %dequeued.id, "Dequeued bounty has no stored record, skipping");
                return;
            }
            Err(e) => {
                error!(bounty_id = %dequeued.id, error = %e, "Failed to load bounty record");
                return;
            }
        };

        if !current.is_eligible_for_processing() {
            debug!(
                bounty_id = %current.id,
                status = current.status.as_str(),
                "Bounty no longer eligible, skipping"
            );
            return;
        }

        let started = match current.start() {
            Ok(started) => started,
            Err(e) => {
                warn!(bounty_id = %dequeued.id, error = %e, "Could not start bounty");
                return;
            }
        };
        if let Err(e) = self.db.update_bounty(&started) {
            error!(bounty_id = %started.id, error = %e, "Failed to persist start transition");
            return;
        }
        info!(
            bounty_id = %started.id,
            issue_id = %started.issue_id,
            "Processing bounty"
        );

        let outcome = match self.processor.process(&started).await {
            Ok(pull_request_id) => started.complete(&pull_request_id),
            Err(e) => {
                warn!(bounty_id = %started.id, error = %e, "Bounty processing failed");
                started.fail(&e.to_string())
            }
        };

        let finished = match outcome {
            Ok(finished) => finished,
            Err(e) => {
                error!(bounty_id = %dequeued.id, error = %e, "Illegal lifecycle transition");
                return;
            }
        };
        if let Err(e) = self.db.update_bounty(&finished) {
            error!(bounty_id = %finished.id, error = %e, "Failed to persist terminal transition");
            return;
        }

        info!(
            bounty_id = %finished.id,
            status = finished.status.as_str(),
            pull_request = ?finished.pull_request_id,
            "Bounty finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bounty::BountyStatus;

    struct FixedProcessor {
        result: Result<String, String>,
    }

    #[async_trait]
    impl BountyProcessor for FixedProcessor {
        async fn process(&self, _bounty: &Bounty) -> Result<String, BountydError> {
            match &self.result {
                Ok(pr) => Ok(pr.clone()),
                Err(reason) => Err(BountydError::Processing(reason.clone())),
            }
        }
    }

    fn worker_with(db: &Database, result: Result<String, String>) -> BountyWorker {
        BountyWorker::new(
            db.clone(),
            TriageQueue::new(db.clone()),
            Arc::new(FixedProcessor { result }),
        )
    }

    fn stored_open_bounty(db: &Database) -> Bounty {
        let bounty = Bounty::new("42", "https://github.com/acme/widget", "github")
            .with_amount_cents(10_000);
        db.create_bounty(&bounty).unwrap();
        bounty
    }

    #[tokio::test]
    async fn test_successful_processing_completes_bounty() {
        let db = Database::in_memory().unwrap();
        let bounty = stored_open_bounty(&db);
        let worker = worker_with(&db, Ok("PR-7".to_string()));

        worker.process_one(bounty.clone()).await;

        let stored = db.get_bounty(&bounty.id).unwrap().unwrap();
        assert_eq!(stored.status, BountyStatus::Completed);
        assert_eq!(stored.pull_request_id.as_deref(), Some("PR-7"));
        assert!(stored.started_at.is_some());
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_processing_marks_failed_with_reason() {
        let db = Database::in_memory().unwrap();
        let bounty = stored_open_bounty(&db);
        let worker = worker_with(&db, Err("patch does not apply".to_string()));

        worker.process_one(bounty.clone()).await;

        let stored = db.get_bounty(&bounty.id).unwrap().unwrap();
        assert_eq!(stored.status, BountyStatus::Failed);
        assert!(stored
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("patch does not apply"));
        assert!(stored.failed_at.is_some());
        assert!(stored.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_ineligible_bounty_is_skipped() {
        let db = Database::in_memory().unwrap();
        let bounty = stored_open_bounty(&db);

        // Failed upstream while it sat in the queue.
        let failed = bounty.clone().fail("issue closed upstream").unwrap();
        db.update_bounty(&failed).unwrap();

        let worker = worker_with(&db, Ok("PR-9".to_string()));
        worker.process_one(bounty.clone()).await;

        let stored = db.get_bounty(&bounty.id).unwrap().unwrap();
        assert_eq!(stored.status, BountyStatus::Failed);
        assert!(stored.pull_request_id.is_none());
    }

    #[tokio::test]
    async fn test_unknown_bounty_is_skipped() {
        let db = Database::in_memory().unwrap();
        let never_stored = Bounty::new("7", "https://github.com/acme/widget", "github");
        let worker = worker_with(&db, Ok("PR-1".to_string()));

        // Must not panic or create a record.
        worker.process_one(never_stored.clone()).await;
        assert!(db.get_bounty(&never_stored.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_drains_queue_in_priority_order() {
        let db = Database::in_memory().unwrap();
        let queue = TriageQueue::new(db.clone());

        let small = Bounty::new("1", "https://github.com/acme/widget", "github")
            .with_amount_cents(2_000);
        let large = Bounty::new("2", "https://github.com/acme/widget", "github")
            .with_amount_cents(90_000);
        for bounty in [&small, &large] {
            db.create_bounty(bounty).unwrap();
            queue.enqueue(bounty).unwrap();
        }

        let worker = BountyWorker::new(
            db.clone(),
            queue,
            Arc::new(FixedProcessor {
                result: Ok("PR-3".to_string()),
            }),
        )
        .with_poll_interval(Duration::from_millis(10));
        let shutdown = CancellationToken::new();
        let run = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let large_done = db
                    .get_bounty(&large.id)
                    .unwrap()
                    .map(|b| b.status == BountyStatus::Completed)
                    .unwrap_or(false);
                let small_done = db
                    .get_bounty(&small.id)
                    .unwrap()
                    .map(|b| b.status == BountyStatus::Completed)
                    .unwrap_or(false);
                if large_done && small_done {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queue was not drained");

        // Higher priority entry must have started first.
        let large_started = db.get_bounty(&large.id).unwrap().unwrap().started_at.unwrap();
        let small_started = db.get_bounty(&small.id).unwrap().unwrap().started_at.unwrap();
        assert!(large_started <= small_started);

        shutdown.cancel();
        run.await.unwrap();
    }
}
