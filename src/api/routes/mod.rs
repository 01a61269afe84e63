pub mod bounties;
pub mod cve;
pub mod github;
pub mod health;
