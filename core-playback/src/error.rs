//! Error types for the playback engine.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A transport command was issued with no track loaded.
    #[error("no track is loaded")]
    NothingLoaded,

    /// No deferred track is waiting for a player surface.
    #[error("no track is pending a player")]
    NothingPending,

    /// The host player rejected a command or failed to provision.
    #[error("player error: {0}")]
    Player(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
