pub mod api;
pub mod cli;
pub mod config;
pub mod cve;
pub mod db;
pub mod errors;
pub mod models;
pub mod oracle;
pub mod platforms;
pub mod triage;
pub mod webhook;
pub mod worker;
