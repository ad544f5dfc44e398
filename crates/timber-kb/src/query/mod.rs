//! Question analysis: field extraction, safety topics, cross-turn merging,
//! and the clarification policy that gates lookups.

pub mod clarify;
pub mod merge;
pub mod parser;
pub mod safety;

pub use clarify::{ClarificationPolicy, FollowUp};
pub use merge::merge;
pub use parser::QueryParser;
pub use safety::SafetyDetector;
