use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::secrets::resolve_secret;
use crate::platforms::poller::{
    DEFAULT_INITIAL_DELAY, DEFAULT_POLL_INTERVAL as DEFAULT_PLATFORM_POLL_INTERVAL,
};
use crate::triage::dispatch::{DEFAULT_ACK_DEADLINE, DEFAULT_DISPATCH_CAPACITY};
use crate::triage::filter::{
    DEFAULT_MAX_TIME_MINUTES, DEFAULT_MIN_CONFIDENCE, DEFAULT_ORACLE_TIMEOUT,
};
use crate::triage::queue::TRIAGE_QUEUE_KEY;
use crate::triage::service::{DEFAULT_MAXIMUM_AMOUNT_CENTS, DEFAULT_MINIMUM_AMOUNT_CENTS};
use crate::worker::consumer::DEFAULT_POLL_INTERVAL as DEFAULT_WORKER_POLL_INTERVAL;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "./data/bountyd.db";
pub const DEFAULT_ALGORA_API_URL: &str = "https://api.algora.io";
pub const DEFAULT_POLAR_API_URL: &str = "https://polar.sh";

/// Daemon configuration as read from YAML. Every section and field is
/// optional; accessors below resolve missing values to the defaults the
/// pipeline modules define.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BountydConfig {
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub webhooks: Option<WebhooksConfig>,
    pub triage: Option<TriageConfig>,
    pub oracle: Option<OracleConfig>,
    pub polling: Option<PollingConfig>,
    pub worker: Option<WorkerConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WebhooksConfig {
    /// HMAC secret for GitHub webhook signatures. `$VAR` references are
    /// resolved from the environment. Absent means verification is off.
    pub github_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TriageConfig {
    pub min_confidence: Option<f64>,
    pub max_time_minutes: Option<u32>,
    pub minimum_amount_cents: Option<i64>,
    pub maximum_amount_cents: Option<i64>,
    pub oracle_timeout_secs: Option<u64>,
    pub queue_key: Option<String>,
    pub dispatch_capacity: Option<usize>,
    pub ack_deadline_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OracleConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PollingConfig {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
    pub initial_delay_secs: Option<u64>,
    pub algora: Option<PlatformConfig>,
    pub polar: Option<PlatformConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PlatformConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WorkerConfig {
    pub enabled: Option<bool>,
    pub poll_interval_secs: Option<u64>,
    /// Shell command the consumer hands each dequeued bounty to. The
    /// queue is left for an external consumer when unset.
    pub command: Option<String>,
}

impl BountydConfig {
    pub fn host(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn database_path(&self) -> String {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
    }

    /// Configured secret first, then the GITHUB_WEBHOOK_SECRET variable.
    pub fn github_secret(&self) -> Option<String> {
        self.webhooks
            .as_ref()
            .and_then(|w| w.github_secret.as_deref())
            .map(resolve_secret)
            .or_else(|| std::env::var("GITHUB_WEBHOOK_SECRET").ok())
            .filter(|s| !s.is_empty())
    }

    pub fn min_confidence(&self) -> f64 {
        self.triage
            .as_ref()
            .and_then(|t| t.min_confidence)
            .unwrap_or(DEFAULT_MIN_CONFIDENCE)
    }

    pub fn max_time_minutes(&self) -> u32 {
        self.triage
            .as_ref()
            .and_then(|t| t.max_time_minutes)
            .unwrap_or(DEFAULT_MAX_TIME_MINUTES)
    }

    pub fn minimum_amount_cents(&self) -> i64 {
        self.triage
            .as_ref()
            .and_then(|t| t.minimum_amount_cents)
            .unwrap_or(DEFAULT_MINIMUM_AMOUNT_CENTS)
    }

    pub fn maximum_amount_cents(&self) -> i64 {
        self.triage
            .as_ref()
            .and_then(|t| t.maximum_amount_cents)
            .unwrap_or(DEFAULT_MAXIMUM_AMOUNT_CENTS)
    }

    pub fn oracle_timeout(&self) -> Duration {
        self.triage
            .as_ref()
            .and_then(|t| t.oracle_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ORACLE_TIMEOUT)
    }

    pub fn queue_key(&self) -> String {
        self.triage
            .as_ref()
            .and_then(|t| t.queue_key.clone())
            .unwrap_or_else(|| TRIAGE_QUEUE_KEY.to_string())
    }

    pub fn dispatch_capacity(&self) -> usize {
        self.triage
            .as_ref()
            .and_then(|t| t.dispatch_capacity)
            .unwrap_or(DEFAULT_DISPATCH_CAPACITY)
    }

    pub fn ack_deadline(&self) -> Duration {
        self.triage
            .as_ref()
            .and_then(|t| t.ack_deadline_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ACK_DEADLINE)
    }

    pub fn oracle_provider(&self) -> String {
        self.oracle
            .as_ref()
            .and_then(|o| o.provider.clone())
            .unwrap_or_else(|| "anthropic".to_string())
    }

    pub fn oracle_model(&self) -> Option<String> {
        self.oracle.as_ref().and_then(|o| o.model.clone())
    }

    pub fn oracle_base_url(&self) -> Option<String> {
        self.oracle.as_ref().and_then(|o| o.base_url.clone())
    }

    /// Configured key first, then the provider's conventional variable.
    pub fn oracle_api_key(&self) -> Option<String> {
        self.oracle
            .as_ref()
            .and_then(|o| o.api_key.as_deref())
            .map(resolve_secret)
            .or_else(|| resolve_api_key_from_env(&self.oracle_provider()))
            .filter(|s| !s.is_empty())
    }

    pub fn polling_enabled(&self) -> bool {
        self.polling.as_ref().and_then(|p| p.enabled).unwrap_or(true)
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling
            .as_ref()
            .and_then(|p| p.interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PLATFORM_POLL_INTERVAL)
    }

    pub fn polling_initial_delay(&self) -> Duration {
        self.polling
            .as_ref()
            .and_then(|p| p.initial_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INITIAL_DELAY)
    }

    pub fn algora_api_url(&self) -> String {
        self.polling
            .as_ref()
            .and_then(|p| p.algora.as_ref())
            .and_then(|a| a.api_url.clone())
            .unwrap_or_else(|| DEFAULT_ALGORA_API_URL.to_string())
    }

    pub fn algora_api_key(&self) -> Option<String> {
        self.polling
            .as_ref()
            .and_then(|p| p.algora.as_ref())
            .and_then(|a| a.api_key.as_deref())
            .map(resolve_secret)
            .filter(|s| !s.is_empty())
    }

    pub fn polar_api_url(&self) -> String {
        self.polling
            .as_ref()
            .and_then(|p| p.polar.as_ref())
            .and_then(|p| p.api_url.clone())
            .unwrap_or_else(|| DEFAULT_POLAR_API_URL.to_string())
    }

    pub fn polar_api_key(&self) -> Option<String> {
        self.polling
            .as_ref()
            .and_then(|p| p.polar.as_ref())
            .and_then(|p| p.api_key.as_deref())
            .map(resolve_secret)
            .filter(|s| !s.is_empty())
    }

    pub fn worker_enabled(&self) -> bool {
        self.worker.as_ref().and_then(|w| w.enabled).unwrap_or(true)
    }

    pub fn worker_command(&self) -> Option<String> {
        self.worker
            .as_ref()
            .and_then(|w| w.command.clone())
            .filter(|c| !c.is_empty())
    }

    pub fn worker_poll_interval(&self) -> Duration {
        self.worker
            .as_ref()
            .and_then(|w| w.poll_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WORKER_POLL_INTERVAL)
    }
}

fn resolve_api_key_from_env(provider: &str) -> Option<String> {
    let var_name = match provider {
        "anthropic" => "ANTHROPIC_API_KEY",
        "openai" => "OPENAI_API_KEY",
        _ => return None,
    };
    std::env::var(var_name).ok()
}
