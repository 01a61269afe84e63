use tracing::{debug, info};
use uuid::Uuid;

use crate::db::Database;
use crate::errors::BountydError;
use crate::models::bounty::Bounty;
use super::filter::AdmissionFilter;
use super::queue::TriageQueue;

pub const DEFAULT_MINIMUM_AMOUNT_CENTS: i64 = 5_000;
pub const DEFAULT_MAXIMUM_AMOUNT_CENTS: i64 = 20_000;

/// What became of a submitted candidate. Rejections and duplicates are
/// business outcomes; only store failures surface as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionOutcome {
    Accepted { id: Uuid },
    Rejected { reason: String },
    Duplicate,
}

/// Runs a candidate through the full admission sequence: duplicate
/// check, amount gates, oracle filter, then persist-and-enqueue on
/// acceptance. Candidates that do not survive are never persisted.
pub struct TriageService {
    db: Database,
    queue: TriageQueue,
    filter: AdmissionFilter,
    minimum_amount_cents: i64,
    maximum_amount_cents: i64,
}

impl TriageService {
    pub fn new(db: Database, queue: TriageQueue, filter: AdmissionFilter) -> Self {
        Self {
            db,
            queue,
            filter,
            minimum_amount_cents: DEFAULT_MINIMUM_AMOUNT_CENTS,
            maximum_amount_cents: DEFAULT_MAXIMUM_AMOUNT_CENTS,
        }
    }

    pub fn with_amount_limits(mut self, minimum_cents: i64, maximum_cents: i64) -> Self {
        self.minimum_amount_cents = minimum_cents;
        self.maximum_amount_cents = maximum_cents;
        self
    }

    pub async fn admit(&self, bounty: Bounty) -> Result<AdmissionOutcome, BountydError> {
        if self
            .db
            .exists_by_issue_and_platform(&bounty.issue_id, &bounty.platform)?
        {
            debug!(
                issue_id = %bounty.issue_id,
                platform = %bounty.platform,
                "Bounty already tracked, skipping"
            );
            return Ok(AdmissionOutcome::Duplicate);
        }

        let reason = match bounty.amount_cents {
            None => Some("no bounty amount found".to_string()),
            Some(cents) if cents < self.minimum_amount_cents => Some(format!(
                "amount ${:.2} below minimum ${:.2}",
                cents as f64 / 100.0,
                self.minimum_amount_cents as f64 / 100.0
            )),
            Some(cents) if cents > self.maximum_amount_cents => Some(format!(
                "amount ${:.2} exceeds maximum ${:.2} (higher amounts usually indicate complexity)",
                cents as f64 / 100.0,
                self.maximum_amount_cents as f64 / 100.0
            )),
            Some(_) => None,
        };
        if let Some(reason) = reason {
            debug!(issue_id = %bounty.issue_id, reason = %reason, "Bounty rejected before assessment");
            return Ok(AdmissionOutcome::Rejected { reason });
        }

        let result = self.filter.decide(&bounty).await;
        if !result.accepted {
            info!(
                issue_id = %bounty.issue_id,
                confidence = result.confidence,
                reason = %result.reason,
                "Bounty rejected by admission filter"
            );
            return Ok(AdmissionOutcome::Rejected { reason: result.reason });
        }

        self.db.create_bounty(&bounty)?;
        self.queue.enqueue(&bounty)?;
        info!(
            issue_id = %bounty.issue_id,
            platform = %bounty.platform,
            confidence = result.confidence,
            estimated_minutes = result.estimated_time_minutes,
            "Bounty accepted and enqueued for processing"
        );
        Ok(AdmissionOutcome::Accepted { id: bounty.id })
    }
}
