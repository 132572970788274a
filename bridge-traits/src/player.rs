//! Media player bridge traits.
//!
//! The core never renders or decodes media itself. Hosts embed an external
//! player surface (a web player widget on desktop, a native view on mobile)
//! and expose it through [`MediaPlayer`]. A [`MediaPlayerFactory`] provisions
//! one player instance per loaded media item and wires the host's event
//! callbacks into an event channel owned by the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;

/// Options applied when a host provisions an embedded player surface.
///
/// Serializable so hosts can pass the settings across an embed boundary
/// (e.g. into a web player widget) without re-describing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Start playback as soon as the player is ready.
    pub autoplay: bool,
    /// Render the host player's own transport controls.
    pub show_controls: bool,
    /// Allow the host player to enter fullscreen.
    pub allow_fullscreen: bool,
    /// Render inline rather than in a detached window.
    pub inline: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            autoplay: true,
            show_controls: false,
            allow_fullscreen: false,
            inline: true,
        }
    }
}

/// Transport state as reported by the host player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlayerState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
}

/// Events pushed from the host player back into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player finished initializing and will now accept commands.
    /// Commands issued before this event may be silently dropped by hosts.
    Ready,
    /// The host player moved to a new transport state.
    StateChanged(HostPlayerState),
    /// The host player failed to load or play the media item.
    Failed { code: u16 },
}

/// Handle to one provisioned host player instance.
///
/// All methods are best-effort commands: the host applies them to the
/// underlying player and reports resulting state through the event channel.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Begin or resume playback.
    async fn play(&self) -> Result<()>;

    /// Pause playback without releasing the player.
    async fn pause(&self) -> Result<()>;

    /// Jump to an absolute position, in seconds.
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Set playback volume in the range `0..=100`.
    async fn set_volume(&self, volume: u8) -> Result<()>;

    /// Current playback position in seconds.
    async fn position(&self) -> Result<f64>;

    /// Total media duration in seconds, `0.0` when not yet known.
    async fn duration(&self) -> Result<f64>;

    /// Tear down the underlying host player and release its resources.
    /// The instance must not be used afterwards.
    async fn destroy(&self) -> Result<()>;
}

/// Provisions host player instances.
///
/// Returns [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable)
/// while the host surface is not yet mounted; callers are expected to retry
/// once the host signals readiness.
#[async_trait]
pub trait MediaPlayerFactory: Send + Sync {
    /// Create a player for `media_id`, delivering its events to `events`.
    async fn create(
        &self,
        media_id: &str,
        settings: PlayerSettings,
        events: mpsc::Sender<PlayerEvent>,
    ) -> Result<Arc<dyn MediaPlayer>>;
}
