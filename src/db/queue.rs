use chrono::Utc;

use crate::errors::BountydError;
use super::Database;

/// A scored queue entry as stored. The payload is opaque at this layer;
/// the triage queue above serializes bounties into it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub member_id: String,
    pub payload: String,
    pub score: f64,
}

impl Database {
    /// Add a member to a queue, or re-score it if already present.
    /// Entries are keyed by (queue, member) so re-adding the same member
    /// never produces a duplicate.
    pub fn queue_add(
        &self,
        queue: &str,
        member_id: &str,
        payload: &str,
        score: f64,
    ) -> Result<(), BountydError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO triage_queue (queue, member_id, payload, score, enqueued_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(queue, member_id) DO UPDATE SET \
             payload = excluded.payload, score = excluded.score, enqueued_at = excluded.enqueued_at",
            rusqlite::params![queue, member_id, payload, score, Utc::now().to_rfc3339()],
        ).map_err(|e| BountydError::Queue(format!("Failed to enqueue: {}", e)))?;
        Ok(())
    }

    /// Remove and return the highest-scored entry, or None when the queue is
    /// empty. Ties break by insertion order. The delete and the read are one
    /// statement so concurrent consumers never pop the same entry.
    pub fn queue_pop_highest(&self, queue: &str) -> Result<Option<QueueEntry>, BountydError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "DELETE FROM triage_queue \
             WHERE queue = ?1 AND member_id = ( \
                 SELECT member_id FROM triage_queue WHERE queue = ?1 \
                 ORDER BY score DESC, rowid ASC LIMIT 1) \
             RETURNING member_id, payload, score",
            rusqlite::params![queue],
            |row| {
                Ok(QueueEntry {
                    member_id: row.get(0)?,
                    payload: row.get(1)?,
                    score: row.get(2)?,
                })
            },
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BountydError::Queue(format!("Failed to pop: {}", e))),
        }
    }

    pub fn queue_len(&self, queue: &str) -> Result<i64, BountydError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM triage_queue WHERE queue = ?1",
            rusqlite::params![queue],
            |row| row.get(0),
        ).map_err(|e| BountydError::Queue(format!("Failed to count queue: {}", e)))
    }

    /// Remove a specific member. Returns whether anything was removed.
    pub fn queue_remove(&self, queue: &str, member_id: &str) -> Result<bool, BountydError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM triage_queue WHERE queue = ?1 AND member_id = ?2",
            rusqlite::params![queue, member_id],
        ).map_err(|e| BountydError::Queue(format!("Failed to remove entry: {}", e)))?;
        Ok(removed > 0)
    }
}
