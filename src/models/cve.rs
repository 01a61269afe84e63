use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CVE severity bands. Labels are matched case-insensitively; anything
/// unrecognized (or absent) collapses to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("CRITICAL") => Severity::Critical,
            Some("HIGH") => Severity::High,
            Some("MEDIUM") => Severity::Medium,
            Some("LOW") => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

/// Where a CVE record entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CveSource {
    Nvd,
    Github,
    Webhook,
}

impl CveSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CveSource::Nvd => "NVD",
            CveSource::Github => "GITHUB",
            CveSource::Webhook => "WEBHOOK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NVD" => Some(CveSource::Nvd),
            "GITHUB" => Some(CveSource::Github),
            "WEBHOOK" => Some(CveSource::Webhook),
            _ => None,
        }
    }
}

/// Canonical CVE record produced by the webhook normalizer and handed to
/// the monitoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cve {
    pub id: Uuid,
    pub cve_id: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub published_at: NaiveDateTime,
    pub last_modified_at: Option<NaiveDateTime>,
    pub affected_languages: Vec<String>,
    pub affected_products: Vec<String>,
    pub source: CveSource,
}

impl Cve {
    pub fn is_critical_or_high(&self) -> bool {
        matches!(self.severity, Severity::Critical | Severity::High)
    }
}

/// CVE identifiers look like `CVE-2024-1234`.
pub fn is_valid_cve_id(id: &str) -> bool {
    let re = regex::Regex::new(r"^CVE-\d{4}-\d+$").unwrap();
    re.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_cve() -> Cve {
        Cve {
            id: Uuid::new_v4(),
            cve_id: "CVE-2024-1234".to_string(),
            description: Some("Deserialization of untrusted data".to_string()),
            severity: Severity::Critical,
            cvss_score: Some(9.8),
            published_at: Utc::now().naive_utc(),
            last_modified_at: None,
            affected_languages: vec!["Java".to_string(), "Kotlin".to_string()],
            affected_products: vec!["Spring Framework".to_string()],
            source: CveSource::Webhook,
        }
    }

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label(Some("critical")), Severity::Critical);
        assert_eq!(Severity::from_label(Some("HIGH")), Severity::High);
        assert_eq!(Severity::from_label(Some(" medium ")), Severity::Medium);
        assert_eq!(Severity::from_label(Some("severe")), Severity::Unknown);
        assert_eq!(Severity::from_label(None), Severity::Unknown);
    }

    #[test]
    fn test_critical_or_high() {
        let mut cve = sample_cve();
        assert!(cve.is_critical_or_high());
        cve.severity = Severity::Medium;
        assert!(!cve.is_critical_or_high());
    }

    #[test]
    fn test_cve_id_format() {
        assert!(is_valid_cve_id("CVE-2024-1234"));
        assert!(is_valid_cve_id("CVE-1999-9"));
        assert!(!is_valid_cve_id("cve-2024-1234"));
        assert!(!is_valid_cve_id("CVE-24-1234"));
        assert!(!is_valid_cve_id("GHSA-xxxx-yyyy"));
        assert!(!is_valid_cve_id(""));
    }
}
