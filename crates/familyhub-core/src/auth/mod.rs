//! Authentication module for the signed-in user's identity.
//!
//! This module provides:
//! - `AuthProvider`: read-only access to who is signed in
//! - `Session`: token-based session persisted to disk, with expiry

pub mod session;

pub use session::{Session, SessionData};

use crate::models::AgeGroup;

/// Identity of the signed-in user, if any.
pub trait AuthProvider {
    fn current_user_id(&self) -> Option<String>;
    fn current_user_age_group(&self) -> Option<AgeGroup>;
}
