//! # Core Playback
//!
//! Headless playback engine. Media is rendered by a host-embedded player
//! behind the `bridge-traits` player traits; this crate owns everything
//! around it: the current track, the up-next queue, shuffle and repeat
//! modes, volume, position polling and end-of-track advancement.

pub mod engine;
pub mod error;
pub mod state;

pub use engine::PlayerEngine;
pub use error::{PlaybackError, Result};
pub use state::{PlayerSnapshot, RepeatMode, Transport};
