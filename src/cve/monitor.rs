use tracing::{debug, info};

use crate::db::Database;
use crate::errors::BountydError;
use crate::models::cve::Cve;

/// Stores CVE notifications handed off by the webhook intake. Records
/// are deduplicated by CVE id.
pub struct CveMonitor {
    db: Database,
}

impl CveMonitor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns true if the CVE was new and stored, false if it was
    /// already known.
    pub fn handle_webhook(&self, cve: &Cve) -> Result<bool, BountydError> {
        info!(cve_id = %cve.cve_id, "Received CVE webhook notification");

        if self.db.cve_exists(&cve.cve_id)? {
            debug!(cve_id = %cve.cve_id, "CVE already exists, skipping");
            return Ok(false);
        }

        self.db.insert_cve(cve)?;
        info!(
            cve_id = %cve.cve_id,
            severity = cve.severity.as_str(),
            actionable = cve.is_critical_or_high(),
            "Saved CVE to database"
        );

        Ok(true)
    }
}
