pub mod connection;
pub mod schema;
pub mod bounties;
pub mod cves;
pub mod queue;

pub use connection::Database;
pub use queue::QueueEntry;
