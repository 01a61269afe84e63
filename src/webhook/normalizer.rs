use chrono::{NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::bounty::Bounty;
use crate::models::cve::{is_valid_cve_id, Cve, CveSource, Severity};
use super::events::{IssueEvent, PushEvent};

/// Outcome of normalizing a webhook payload. `Discarded` is a benign
/// classification for events the pipeline deliberately ignores, not an
/// error.
#[derive(Debug, Clone)]
pub enum Normalized {
    /// An issue worth triaging, constructed at OPEN.
    Candidate(Bounty),
    /// A push happened; the repository collaborator should refresh its copy.
    RepositoryTouched {
        repository_url: String,
        full_name: String,
        branch: Option<String>,
        default_branch: bool,
        commit_count: usize,
    },
    /// A CVE record for the monitoring pipeline.
    Cve(Cve),
    Discarded { reason: String },
}

/// Candidate key names per logical CVE field, in priority order. Different
/// CVE feed providers disagree on naming; new shapes are added here.
const CVE_ID_KEYS: &[&str] = &["cveId", "cve_id", "id"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary"];
const SEVERITY_KEYS: &[&str] = &["severity", "cvss_severity"];
const SCORE_KEYS: &[&str] = &["cvssScore", "cvss_score", "score"];
const PUBLISHED_KEYS: &[&str] = &["publishedDate", "published_date", "published"];
const MODIFIED_KEYS: &[&str] = &["lastModifiedDate", "last_modified_date", "lastModified"];
const LANGUAGE_KEYS: &[&str] = &["affectedLanguages", "affected_languages", "languages"];
const PRODUCT_KEYS: &[&str] = &["affectedProducts", "affected_products", "products"];

/// Only "opened"/"reopened" actions on open, non-pull-request issues
/// produce a candidate. Everything else is a deliberate no-op.
pub fn normalize_issue(event: &IssueEvent) -> Normalized {
    if event.is_pull_request() {
        return Normalized::Discarded {
            reason: "pull request event".to_string(),
        };
    }

    if event.action != "opened" && event.action != "reopened" {
        return Normalized::Discarded {
            reason: format!("issue action '{}' is not tracked", event.action),
        };
    }

    if !event.is_open() {
        return Normalized::Discarded {
            reason: "issue is not open".to_string(),
        };
    }

    let combined = format!(
        "{} {}",
        event.issue.title.as_deref().unwrap_or(""),
        event.issue.body.as_deref().unwrap_or("")
    );

    let mut bounty = Bounty::new(
        &event.issue.number.to_string(),
        &event.repository_url(),
        "github",
    )
    .with_currency("USD");

    if let Some(cents) = extract_amount_cents(&combined) {
        bounty = bounty.with_amount_cents(cents);
    }
    if let Some(title) = &event.issue.title {
        bounty = bounty.with_title(title);
    }
    if let Some(body) = &event.issue.body {
        bounty = bounty.with_description(body);
    }

    Normalized::Candidate(bounty)
}

/// Pushes never produce a candidate. They signal that the repository
/// changed so an already-cloned copy can be updated in place.
pub fn normalize_push(event: &PushEvent) -> Normalized {
    Normalized::RepositoryTouched {
        repository_url: event.repository.clone_url.clone(),
        full_name: event.repository.full_name.clone(),
        branch: event.branch_name().map(str::to_string),
        default_branch: event.is_default_branch(),
        commit_count: event.commits.len(),
    }
}

/// Normalize a CVE webhook body. Providers disagree on key naming, so
/// each field is resolved through its alias list. A payload without a
/// usable CVE identifier is discarded with a diagnostic rather than
/// surfacing a parse fault.
pub fn normalize_cve(payload: &Value) -> Normalized {
    let cve_id = match first_string(payload, CVE_ID_KEYS) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Normalized::Discarded {
                reason: "missing cveId".to_string(),
            }
        }
    };

    if !is_valid_cve_id(&cve_id) {
        return Normalized::Discarded {
            reason: format!("malformed cveId '{}'", cve_id),
        };
    }

    let published_at = first_string(payload, PUBLISHED_KEYS)
        .as_deref()
        .and_then(parse_local_datetime)
        .unwrap_or_else(|| Utc::now().naive_utc());

    let last_modified_at = first_string(payload, MODIFIED_KEYS)
        .as_deref()
        .and_then(parse_local_datetime);

    Normalized::Cve(Cve {
        id: Uuid::new_v4(),
        cve_id,
        description: first_string(payload, DESCRIPTION_KEYS),
        severity: Severity::from_label(first_string(payload, SEVERITY_KEYS).as_deref()),
        cvss_score: first_f64(payload, SCORE_KEYS),
        published_at,
        last_modified_at,
        affected_languages: first_string_list(payload, LANGUAGE_KEYS),
        affected_products: first_string_list(payload, PRODUCT_KEYS),
        source: CveSource::Webhook,
    })
}

/// Largest dollar amount mentioned in the text, in cents. Amounts under
/// $10 are skipped as noise (issue numbers, version strings).
pub fn extract_amount_cents(text: &str) -> Option<i64> {
    let pattern = regex::Regex::new(r"\$([0-9]{1,3}(?:,?[0-9]{3})*(?:\.[0-9]{2})?)").unwrap();
    let mut max_cents: Option<i64> = None;
    for captures in pattern.captures_iter(text) {
        if let Some(cents) = parse_cents(&captures[1]) {
            if cents >= 1_000 && max_cents.map_or(true, |max| cents > max) {
                max_cents = Some(cents);
            }
        }
    }
    max_cents
}

fn parse_cents(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    let (dollars, cents) = match cleaned.split_once('.') {
        Some((d, c)) => (d, c),
        None => (cleaned.as_str(), "0"),
    };
    let dollars: i64 = dollars.parse().ok()?;
    let cents: i64 = cents.parse().ok()?;
    // Figures too large for cents arithmetic are noise, not money.
    dollars.checked_mul(100)?.checked_add(cents)
}

fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn first_f64(payload: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match payload.get(key) {
            Some(Value::Number(n)) => {
                if let Some(f) = n.as_f64() {
                    return Some(f);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(f) = s.parse::<f64>() {
                    return Some(f);
                }
            }
            _ => {}
        }
    }
    None
}

fn first_string_list(payload: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Some(Value::Array(items)) = payload.get(key) {
            return items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
        }
    }
    Vec::new()
}

/// ISO-8601 local date-time with or without fractional seconds. A
/// trailing `Z` is tolerated and ignored since feeds mix the two.
fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .ok()
}
