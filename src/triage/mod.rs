pub mod filter;
pub mod queue;
pub mod service;
pub mod dispatch;

pub use filter::{AdmissionFilter, FilterResult};
pub use queue::TriageQueue;
pub use service::{AdmissionOutcome, TriageService};
pub use dispatch::{spawn_admission_worker, TriageDispatcher};
