pub mod bounty;
pub mod cve;

pub use bounty::*;
pub use cve::*;
