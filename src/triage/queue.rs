use tracing::debug;

use crate::db::Database;
use crate::errors::BountydError;
use crate::models::bounty::Bounty;

pub const TRIAGE_QUEUE_KEY: &str = "triage:queue";
const BASE_PRIORITY: f64 = 1000.0;

/// Priority at enqueue time. Computed once; never recomputed on dequeue.
pub fn calculate_priority(bounty: &Bounty) -> f64 {
    let mut priority = BASE_PRIORITY;

    // Higher amount = higher priority
    if let Some(amount) = bounty.amount_dollars() {
        priority += amount;
    }

    // Slight preference for Algora
    if bounty.platform == "algora" {
        priority += 100.0;
    }

    priority
}

/// Durable, score-ordered queue of admitted bounties. Entries are keyed
/// by bounty id, so enqueueing the same bounty twice re-scores the one
/// entry instead of duplicating it, and `remove` targets exactly one
/// bounty.
#[derive(Clone)]
pub struct TriageQueue {
    db: Database,
    queue_key: String,
}

impl TriageQueue {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            queue_key: TRIAGE_QUEUE_KEY.to_string(),
        }
    }

    pub fn with_key(db: Database, queue_key: &str) -> Self {
        Self {
            db,
            queue_key: queue_key.to_string(),
        }
    }

    pub fn enqueue(&self, bounty: &Bounty) -> Result<(), BountydError> {
        let payload = serde_json::to_string(bounty)?;
        let score = calculate_priority(bounty);
        self.db
            .queue_add(&self.queue_key, &bounty.id.to_string(), &payload, score)?;
        debug!(issue_id = %bounty.issue_id, score, "Enqueued bounty");
        Ok(())
    }

    /// Atomically remove and return the highest-priority bounty, or None
    /// when the queue is empty. Errors mean the store is unavailable and
    /// are distinct from emptiness; callers retry those with backoff.
    pub fn dequeue(&self) -> Result<Option<Bounty>, BountydError> {
        let entry = match self.db.queue_pop_highest(&self.queue_key)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let bounty: Bounty = serde_json::from_str(&entry.payload)?;
        debug!(issue_id = %bounty.issue_id, score = entry.score, "Dequeued bounty");
        Ok(Some(bounty))
    }

    pub fn len(&self) -> Result<i64, BountydError> {
        self.db.queue_len(&self.queue_key)
    }

    pub fn is_empty(&self) -> Result<bool, BountydError> {
        Ok(self.len()? == 0)
    }

    pub fn remove(&self, bounty: &Bounty) -> Result<bool, BountydError> {
        self.db.queue_remove(&self.queue_key, &bounty.id.to_string())
    }
}
