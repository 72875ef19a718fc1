//! Analysis and result aggregation modules
//!
//! Turns analyzer scores and scam indicators into the final result:
//! - Score fusion and classification
//! - Result types and persistence payload
//! - Metadata
//! - Wall-clock budget

pub mod deadline;
pub mod fusion;
pub mod metadata;
pub mod result;
