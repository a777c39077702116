//! Data models for familyhub entities.
//!
//! - `Family`, `MemberRecord`, `AgeGroup`: family rosters
//! - `Task`: chores and goals tracked per family

pub mod family;
pub mod task;

pub use family::{AgeGroup, Family, MemberRecord};
pub use task::Task;
