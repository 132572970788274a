//! Transport state, repeat modes and observable snapshots.

use core_catalog::Track;
use serde::{Deserialize, Serialize};

/// Coarse transport state of the engine.
///
/// `Loading` covers the window between choosing a track and the host player
/// reporting ready. `Ended` means the last track finished with nothing else
/// scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// Repeat behavior applied when a track finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    Off,
    All,
    One,
}

impl RepeatMode {
    /// The cycle order the repeat toggle walks through: off, all, one.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Point-in-time snapshot of the engine, safe to hand to a UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub track: Option<Track>,
    pub transport: Transport,
    /// Current position in seconds.
    pub progress_secs: f64,
    /// Duration of the current track in seconds, `0.0` when unknown.
    pub duration_secs: f64,
    pub volume: u8,
    pub queue: Vec<Track>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// A track is waiting for the host player surface to become available.
    pub pending_player: bool,
}
