//! # Core Session
//!
//! Local user sessions: sign-in, sign-up, sign-out, restore on launch and
//! profile edits. Profiles are synthesized locally (no account backend) and
//! persisted as JSON through the injected `KvStore`.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use types::{ProfileUpdate, UserProfile};
