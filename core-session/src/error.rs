//! Error types for session management.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation required a signed-in user and none is present.
    #[error("no user is signed in")]
    NotSignedIn,

    /// The supplied credentials failed validation.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The durable store rejected a read or write.
    #[error("session storage error: {0}")]
    Storage(#[from] BridgeError),

    /// A profile could not be serialized for persistence.
    #[error("failed to serialize session: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
