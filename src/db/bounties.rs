use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::BountydError;
use crate::models::bounty::{Bounty, BountyStatus};
use super::Database;

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

fn parse_utc(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, format!("bad timestamp '{}': {}", value, e)))
}

fn parse_opt_utc(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match value {
        Some(s) => parse_utc(idx, &s).map(Some),
        None => Ok(None),
    }
}

fn row_to_bounty(row: &rusqlite::Row) -> rusqlite::Result<Bounty> {
    let id_str: String = row.get(0)?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| conversion_err(0, format!("bad bounty id '{}': {}", id_str, e)))?;

    let status_str: String = row.get(8)?;
    let status = BountyStatus::parse(&status_str)
        .ok_or_else(|| conversion_err(8, format!("unknown bounty status '{}'", status_str)))?;

    Ok(Bounty {
        id,
        issue_id: row.get(1)?,
        repository_url: row.get(2)?,
        platform: row.get(3)?,
        amount_cents: row.get(4)?,
        currency: row.get(5)?,
        title: row.get(6)?,
        description: row.get(7)?,
        status,
        created_at: parse_utc(9, &row.get::<_, String>(9)?)?,
        started_at: parse_opt_utc(10, row.get(10)?)?,
        completed_at: parse_opt_utc(11, row.get(11)?)?,
        failed_at: parse_opt_utc(12, row.get(12)?)?,
        pull_request_id: row.get(13)?,
        failure_reason: row.get(14)?,
    })
}

const BOUNTY_COLUMNS: &str = "id, issue_id, repository_url, platform, amount_cents, currency, \
    title, description, status, created_at, started_at, completed_at, failed_at, \
    pull_request_id, failure_reason";

impl Database {
    pub fn create_bounty(&self, bounty: &Bounty) -> Result<(), BountydError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO bounties (id, issue_id, repository_url, platform, amount_cents, currency, \
             title, description, status, created_at, started_at, completed_at, failed_at, \
             pull_request_id, failure_reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                bounty.id.to_string(),
                bounty.issue_id,
                bounty.repository_url,
                bounty.platform,
                bounty.amount_cents,
                bounty.currency,
                bounty.title,
                bounty.description,
                bounty.status.as_str(),
                bounty.created_at.to_rfc3339(),
                bounty.started_at.map(|dt| dt.to_rfc3339()),
                bounty.completed_at.map(|dt| dt.to_rfc3339()),
                bounty.failed_at.map(|dt| dt.to_rfc3339()),
                bounty.pull_request_id,
                bounty.failure_reason,
            ],
        ).map_err(|e| BountydError::Database(format!("Failed to insert bounty: {}", e)))?;
        Ok(())
    }

    pub fn get_bounty(&self, id: &Uuid) -> Result<Option<Bounty>, BountydError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            &format!("SELECT {} FROM bounties WHERE id = ?1", BOUNTY_COLUMNS),
            rusqlite::params![id.to_string()],
            row_to_bounty,
        );

        match result {
            Ok(bounty) => Ok(Some(bounty)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BountydError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn exists_by_issue_and_platform(
        &self,
        issue_id: &str,
        platform: &str,
    ) -> Result<bool, BountydError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bounties WHERE issue_id = ?1 AND platform = ?2",
            rusqlite::params![issue_id, platform],
            |row| row.get(0),
        ).map_err(|e| BountydError::Database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }

    /// Persist one lifecycle mutation as a single atomic update.
    pub fn update_bounty(&self, bounty: &Bounty) -> Result<bool, BountydError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE bounties SET status = ?2, started_at = ?3, completed_at = ?4, \
             failed_at = ?5, pull_request_id = ?6, failure_reason = ?7 WHERE id = ?1",
            rusqlite::params![
                bounty.id.to_string(),
                bounty.status.as_str(),
                bounty.started_at.map(|dt| dt.to_rfc3339()),
                bounty.completed_at.map(|dt| dt.to_rfc3339()),
                bounty.failed_at.map(|dt| dt.to_rfc3339()),
                bounty.pull_request_id,
                bounty.failure_reason,
            ],
        ).map_err(|e| BountydError::Database(format!("Failed to update bounty: {}", e)))?;
        Ok(updated > 0)
    }

    pub fn list_bounties(&self, limit: usize, offset: usize) -> Result<Vec<Bounty>, BountydError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            &format!(
                "SELECT {} FROM bounties ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                BOUNTY_COLUMNS
            ),
        ).map_err(|e| BountydError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![limit as i64, offset as i64], row_to_bounty)
            .map_err(|e| BountydError::Database(format!("Query failed: {}", e)))?;

        let mut bounties = Vec::new();
        for row in rows {
            bounties.push(row.map_err(|e| BountydError::Database(format!("Row error: {}", e)))?);
        }
        Ok(bounties)
    }

    pub fn count_bounties_by_status(&self) -> Result<Vec<(String, i64)>, BountydError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM bounties GROUP BY status ORDER BY status",
        ).map_err(|e| BountydError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| BountydError::Database(format!("Query failed: {}", e)))?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row.map_err(|e| BountydError::Database(format!("Row error: {}", e)))?);
        }
        Ok(counts)
    }
}
