pub mod signature;
pub mod events;
pub mod normalizer;

pub use signature::SignatureVerifier;
pub use events::{IssueEvent, PushEvent};
pub use normalizer::Normalized;
