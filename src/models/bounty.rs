use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle status of a bounty. `Open` is the unique initial state;
/// `Completed` and `Failed` are terminal and absorb all further events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BountyStatus {
    Open,
    InProgress,
    Completed,
    Failed,
}

impl BountyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BountyStatus::Open => "OPEN",
            BountyStatus::InProgress => "IN_PROGRESS",
            BountyStatus::Completed => "COMPLETED",
            BountyStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(BountyStatus::Open),
            "IN_PROGRESS" => Some(BountyStatus::InProgress),
            "COMPLETED" => Some(BountyStatus::Completed),
            "FAILED" => Some(BountyStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BountyStatus::Completed | BountyStatus::Failed)
    }
}

/// Returned when a lifecycle event is not legal from the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} a bounty in state {from:?}")]
pub struct InvalidTransition {
    pub from: BountyStatus,
    pub event: &'static str,
}

impl From<InvalidTransition> for crate::errors::BountydError {
    fn from(err: InvalidTransition) -> Self {
        crate::errors::BountydError::Lifecycle(err.to_string())
    }
}

/// A unit of potential remediation work, tracked from intake to a terminal
/// state. Values are immutable: lifecycle events return a new `Bounty`
/// rather than mutating in place.
///
/// Amounts are stored in integer minor units (cents) so that threshold
/// comparisons are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    pub id: Uuid,
    pub issue_id: String,
    pub repository_url: String,
    pub platform: String,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: BountyStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub pull_request_id: Option<String>,
    pub failure_reason: Option<String>,
}

impl Bounty {
    pub fn new(issue_id: &str, repository_url: &str, platform: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            issue_id: issue_id.to_string(),
            repository_url: repository_url.to_string(),
            platform: platform.to_string(),
            amount_cents: None,
            currency: None,
            title: None,
            description: None,
            status: BountyStatus::Open,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            pull_request_id: None,
            failure_reason: None,
        }
    }

    pub fn with_amount_cents(mut self, cents: i64) -> Self {
        self.amount_cents = Some(cents);
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = Some(currency.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Open -> InProgress, recording the start timestamp.
    pub fn start(self) -> Result<Bounty, InvalidTransition> {
        match self.status {
            BountyStatus::Open => Ok(Bounty {
                status: BountyStatus::InProgress,
                started_at: Some(Utc::now()),
                ..self
            }),
            from => Err(InvalidTransition { from, event: "start" }),
        }
    }

    /// InProgress -> Completed, recording the completion timestamp and the
    /// pull request produced by downstream automation.
    pub fn complete(self, pull_request_id: &str) -> Result<Bounty, InvalidTransition> {
        match self.status {
            BountyStatus::InProgress => Ok(Bounty {
                status: BountyStatus::Completed,
                completed_at: Some(Utc::now()),
                pull_request_id: Some(pull_request_id.to_string()),
                ..self
            }),
            from => Err(InvalidTransition { from, event: "complete" }),
        }
    }

    /// Open or InProgress -> Failed. Failing from Open covers candidates
    /// invalidated before any work started (issue closed upstream).
    pub fn fail(self, reason: &str) -> Result<Bounty, InvalidTransition> {
        match self.status {
            BountyStatus::Open | BountyStatus::InProgress => Ok(Bounty {
                status: BountyStatus::Failed,
                failed_at: Some(Utc::now()),
                failure_reason: Some(reason.to_string()),
                ..self
            }),
            from => Err(InvalidTransition { from, event: "fail" }),
        }
    }

    /// Only Open bounties may be picked up by the consumer loop.
    pub fn is_eligible_for_processing(&self) -> bool {
        self.status == BountyStatus::Open
    }

    pub fn amount_dollars(&self) -> Option<f64> {
        self.amount_cents.map(|cents| cents as f64 / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_bounty() -> Bounty {
        Bounty::new("42", "https://github.com/acme/widget", "github")
            .with_amount_cents(15_000)
            .with_currency("USD")
            .with_title("Fix off-by-one in pagination")
    }

    #[test]
    fn test_new_bounty_starts_open() {
        let bounty = open_bounty();
        assert_eq!(bounty.status, BountyStatus::Open);
        assert!(bounty.started_at.is_none());
        assert!(bounty.completed_at.is_none());
        assert!(bounty.failed_at.is_none());
        assert!(bounty.is_eligible_for_processing());
    }

    #[test]
    fn test_start_from_open() {
        let started = open_bounty().start().unwrap();
        assert_eq!(started.status, BountyStatus::InProgress);
        assert!(started.started_at.is_some());
        assert!(!started.is_eligible_for_processing());
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let err = open_bounty().complete("PR-7").unwrap_err();
        assert_eq!(err.from, BountyStatus::Open);
        assert_eq!(err.event, "complete");
    }

    #[test]
    fn test_complete_from_in_progress() {
        let done = open_bounty().start().unwrap().complete("PR-7").unwrap();
        assert_eq!(done.status, BountyStatus::Completed);
        assert_eq!(done.pull_request_id.as_deref(), Some("PR-7"));
        assert!(done.completed_at.is_some());
        assert!(done.failed_at.is_none());
    }

    #[test]
    fn test_fail_from_open() {
        let failed = open_bounty().fail("issue closed upstream").unwrap();
        assert_eq!(failed.status, BountyStatus::Failed);
        assert!(failed.failed_at.is_some());
        assert!(failed.started_at.is_none());
        assert_eq!(failed.failure_reason.as_deref(), Some("issue closed upstream"));
    }

    #[test]
    fn test_fail_from_in_progress() {
        let failed = open_bounty().start().unwrap().fail("fix rejected").unwrap();
        assert_eq!(failed.status, BountyStatus::Failed);
        assert!(failed.started_at.is_some());
        assert!(failed.completed_at.is_none());
    }

    #[test]
    fn test_terminal_states_absorb() {
        let done = open_bounty().start().unwrap().complete("PR-7").unwrap();
        assert!(done.clone().start().is_err());
        assert!(done.clone().fail("nope").is_err());
        assert!(done.complete("PR-8").is_err());

        let failed = open_bounty().fail("gone").unwrap();
        assert!(failed.clone().start().is_err());
        assert!(failed.complete("PR-9").is_err());
    }

    #[test]
    fn test_exactly_one_terminal_timestamp() {
        let done = open_bounty().start().unwrap().complete("PR-7").unwrap();
        assert!(done.completed_at.is_some() && done.failed_at.is_none());

        let failed = open_bounty().start().unwrap().fail("broke").unwrap();
        assert!(failed.failed_at.is_some() && failed.completed_at.is_none());
    }

    #[test]
    fn test_amount_dollars_conversion() {
        assert_eq!(open_bounty().amount_dollars(), Some(150.0));
        let no_amount = Bounty::new("7", "https://github.com/acme/widget", "github");
        assert_eq!(no_amount.amount_dollars(), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            BountyStatus::Open,
            BountyStatus::InProgress,
            BountyStatus::Completed,
            BountyStatus::Failed,
        ] {
            assert_eq!(BountyStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BountyStatus::parse("UNKNOWN"), None);
    }
}
