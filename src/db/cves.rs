use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

use crate::errors::BountydError;
use crate::models::cve::{Cve, CveSource, Severity};
use super::Database;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn format_naive(dt: &NaiveDateTime) -> String {
    dt.format(NAIVE_FORMAT).to_string()
}

fn parse_naive(idx: usize, value: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("bad datetime '{}': {}", value, e).into(),
        )
    })
}

fn parse_string_list(value: Option<String>) -> Vec<String> {
    value
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn row_to_cve(row: &rusqlite::Row) -> rusqlite::Result<Cve> {
    let id_str: String = row.get(0)?;
    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("bad cve row id '{}': {}", id_str, e).into(),
        )
    })?;

    let severity_str: String = row.get(3)?;
    let source_str: String = row.get(9)?;
    let last_modified: Option<String> = row.get(6)?;

    Ok(Cve {
        id,
        cve_id: row.get(1)?,
        description: row.get(2)?,
        severity: Severity::from_label(Some(&severity_str)),
        cvss_score: row.get(4)?,
        published_at: parse_naive(5, &row.get::<_, String>(5)?)?,
        last_modified_at: match last_modified {
            Some(s) => Some(parse_naive(6, &s)?),
            None => None,
        },
        affected_languages: parse_string_list(row.get(7)?),
        affected_products: parse_string_list(row.get(8)?),
        source: CveSource::parse(&source_str).unwrap_or(CveSource::Webhook),
    })
}

impl Database {
    pub fn insert_cve(&self, cve: &Cve) -> Result<(), BountydError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cves (id, cve_id, description, severity, cvss_score, published_at, \
             last_modified_at, affected_languages, affected_products, source, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                cve.id.to_string(),
                cve.cve_id,
                cve.description,
                cve.severity.as_str(),
                cve.cvss_score,
                format_naive(&cve.published_at),
                cve.last_modified_at.as_ref().map(format_naive),
                serde_json::to_string(&cve.affected_languages)?,
                serde_json::to_string(&cve.affected_products)?,
                cve.source.as_str(),
                Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| BountydError::Database(format!("Failed to insert CVE: {}", e)))?;
        Ok(())
    }

    pub fn cve_exists(&self, cve_id: &str) -> Result<bool, BountydError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cves WHERE cve_id = ?1",
            rusqlite::params![cve_id],
            |row| row.get(0),
        ).map_err(|e| BountydError::Database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }

    pub fn get_cve(&self, cve_id: &str) -> Result<Option<Cve>, BountydError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, cve_id, description, severity, cvss_score, published_at, \
             last_modified_at, affected_languages, affected_products, source \
             FROM cves WHERE cve_id = ?1",
            rusqlite::params![cve_id],
            row_to_cve,
        );

        match result {
            Ok(cve) => Ok(Some(cve)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BountydError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn count_cves(&self) -> Result<i64, BountydError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM cves", [], |row| row.get(0))
            .map_err(|e| BountydError::Database(format!("Query error: {}", e)))
    }
}
