//! The playback engine.
//!
//! Owns the current track, the up-next queue and transport state, and drives
//! one host player instance at a time through [`MediaPlayerFactory`]. Loading
//! a track bumps an internal generation counter; callbacks and pollers tagged
//! with an older generation become no-ops, so a rapid track switch can never
//! let the torn-down player overwrite the new one's state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::error::BridgeError;
use bridge_traits::player::{
    HostPlayerState, MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerSettings,
};
use core_catalog::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::PlaybackConfig;
use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::state::{PlayerSnapshot, RepeatMode, Transport};

const PLAYER_EVENT_BUFFER: usize = 16;

struct EngineInner {
    current: Option<Track>,
    transport: Transport,
    volume: u8,
    /// Position in seconds, updated by the poller and by seeks.
    progress: f64,
    /// Duration in seconds, `0.0` until the player reports it.
    duration: f64,
    queue: Vec<Track>,
    shuffle: bool,
    repeat: RepeatMode,
    /// Bumped on every load; stale async work checks this and bails.
    generation: u64,
    player: Option<Arc<dyn MediaPlayer>>,
    /// Track deferred because the host player surface was not available.
    pending: Option<Track>,
    poll_task: Option<JoinHandle<()>>,
}

/// Playback engine handle.
///
/// Cloneable; clones share all state. Typically one engine lives for the
/// whole application session.
#[derive(Clone)]
pub struct PlayerEngine {
    inner: Arc<Mutex<EngineInner>>,
    factory: Arc<dyn MediaPlayerFactory>,
    events: EventBus,
    config: PlaybackConfig,
}

impl PlayerEngine {
    pub fn new(
        factory: Arc<dyn MediaPlayerFactory>,
        events: EventBus,
        config: PlaybackConfig,
    ) -> Self {
        let volume = config.default_volume.min(100);
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                current: None,
                transport: Transport::Idle,
                volume,
                progress: 0.0,
                duration: 0.0,
                queue: Vec::new(),
                shuffle: false,
                repeat: RepeatMode::Off,
                generation: 0,
                player: None,
                pending: None,
                poll_task: None,
            })),
            factory,
            events,
            config,
        }
    }

    // ===== Loading =====

    /// Makes `track` the current track and provisions a player for it.
    ///
    /// Any previously loaded player is destroyed first. If the host surface
    /// is not available yet the track is parked; call [`retry_pending`]
    /// once the host signals readiness.
    ///
    /// [`retry_pending`]: PlayerEngine::retry_pending
    pub fn play_track(&self, track: Track) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Track-end handling runs inside the player event task and can land
        // back here (queue advance, repeat-all replay), so the future must be
        // boxed to keep its type from containing itself.
        Box::pin(self.play_track_inner(track))
    }

    async fn play_track_inner(&self, track: Track) -> Result<()> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            let generation = inner.generation;
            if let Some(handle) = inner.poll_task.take() {
                handle.abort();
            }
            let old_player = inner.player.take();
            inner.current = Some(track.clone());
            inner.transport = Transport::Loading;
            inner.progress = 0.0;
            inner.duration = 0.0;
            inner.pending = None;
            drop(inner);

            if let Some(old) = old_player {
                if let Err(e) = old.destroy().await {
                    warn!(error = %e, "failed to destroy previous player");
                }
            }
            generation
        };

        debug!(track_id = %track.id, title = %track.title, "loading track");
        self.emit(PlaybackEvent::TrackLoaded {
            track_id: track.id.clone(),
            title: track.title.clone(),
        });

        self.provision(track, generation).await
    }

    async fn provision(&self, track: Track, generation: u64) -> Result<()> {
        let (tx, rx) = mpsc::channel(PLAYER_EVENT_BUFFER);
        match self
            .factory
            .create(&track.id, PlayerSettings::default(), tx)
            .await
        {
            Ok(player) => {
                let mut inner = self.inner.lock().await;
                if inner.generation != generation {
                    drop(inner);
                    let _ = player.destroy().await;
                    return Ok(());
                }
                inner.player = Some(player);
                drop(inner);

                let engine = self.clone();
                tokio::spawn(async move {
                    engine.run_player_events(rx, generation).await;
                });
                Ok(())
            }
            Err(BridgeError::NotAvailable(reason)) => {
                debug!(track_id = %track.id, %reason, "player surface unavailable, deferring");
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.pending = Some(track);
                    inner.transport = Transport::Idle;
                }
                Ok(())
            }
            Err(e) => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.generation == generation {
                        inner.transport = Transport::Idle;
                    }
                }
                self.emit(PlaybackEvent::Error {
                    track_id: Some(track.id.clone()),
                    message: e.to_string(),
                    recoverable: false,
                });
                Err(e.into())
            }
        }
    }

    /// Retries a load that was deferred because no player surface existed.
    pub async fn retry_pending(&self) -> Result<()> {
        let track = {
            let mut inner = self.inner.lock().await;
            inner.pending.take().ok_or(PlaybackError::NothingPending)?
        };
        self.play_track(track).await
    }

    // ===== Transport =====

    pub async fn pause(&self) -> Result<()> {
        let (player, position, track_id) = {
            let mut inner = self.inner.lock().await;
            let player = inner.player.clone().ok_or(PlaybackError::NothingLoaded)?;
            inner.transport = Transport::Paused;
            let track_id = inner.current.as_ref().map(|t| t.id.clone());
            (player, inner.progress, track_id)
        };
        player.pause().await?;
        if let Some(track_id) = track_id {
            self.emit(PlaybackEvent::Paused {
                track_id,
                position_secs: position,
            });
        }
        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        let (player, position, track_id) = {
            let mut inner = self.inner.lock().await;
            let player = inner.player.clone().ok_or(PlaybackError::NothingLoaded)?;
            inner.transport = Transport::Playing;
            let track_id = inner.current.as_ref().map(|t| t.id.clone());
            (player, inner.progress, track_id)
        };
        player.play().await?;
        if let Some(track_id) = track_id {
            self.emit(PlaybackEvent::Resumed {
                track_id,
                position_secs: position,
            });
        }
        Ok(())
    }

    pub async fn toggle_play(&self) -> Result<()> {
        let playing = self.inner.lock().await.transport == Transport::Playing;
        if playing {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    /// Seeks to an absolute position in seconds, clamped to the known
    /// duration.
    pub async fn seek(&self, seconds: f64) -> Result<()> {
        let (player, target, track_id, duration) = {
            let mut inner = self.inner.lock().await;
            let player = inner.player.clone().ok_or(PlaybackError::NothingLoaded)?;
            let target = if inner.duration > 0.0 {
                seconds.clamp(0.0, inner.duration)
            } else {
                seconds.max(0.0)
            };
            inner.progress = target;
            let track_id = inner.current.as_ref().map(|t| t.id.clone());
            (player, target, track_id, inner.duration)
        };
        player.seek(target).await?;
        if let Some(track_id) = track_id {
            self.emit(PlaybackEvent::PositionChanged {
                track_id,
                position_secs: target,
                duration_secs: duration,
            });
        }
        Ok(())
    }

    /// Sets the volume, clamped to `0..=100`.
    ///
    /// The level is remembered even with no player loaded and applied to the
    /// next provisioned player.
    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        let volume = volume.min(100);
        let player = {
            let mut inner = self.inner.lock().await;
            inner.volume = volume;
            inner.player.clone()
        };
        if let Some(player) = player {
            player.set_volume(volume).await?;
        }
        self.emit(PlaybackEvent::VolumeChanged { volume });
        Ok(())
    }

    // ===== Queue =====

    pub async fn add_to_queue(&self, track: Track) {
        let queue_len = {
            let mut inner = self.inner.lock().await;
            inner.queue.push(track);
            inner.queue.len()
        };
        self.emit(PlaybackEvent::QueueChanged { queue_len });
    }

    pub async fn clear_queue(&self) {
        self.inner.lock().await.queue.clear();
        self.emit(PlaybackEvent::QueueChanged { queue_len: 0 });
    }

    /// Advances to the next queued track. With shuffle on, a random queue
    /// entry is taken instead of the front. No-op on an empty queue.
    pub async fn next(&self) -> Result<()> {
        let (track, queue_len) = {
            let mut inner = self.inner.lock().await;
            if inner.queue.is_empty() {
                debug!("next requested on empty queue");
                return Ok(());
            }
            let index = if inner.shuffle {
                rand::thread_rng().gen_range(0..inner.queue.len())
            } else {
                0
            };
            let track = inner.queue.remove(index);
            (track, inner.queue.len())
        };
        self.emit(PlaybackEvent::QueueChanged { queue_len });
        self.play_track(track).await
    }

    /// Restarts the current track, or reloads it from scratch when playback
    /// has barely begun. There is no played-history stack.
    pub async fn previous(&self) -> Result<()> {
        let (restart, current) = {
            let inner = self.inner.lock().await;
            let current = inner.current.clone().ok_or(PlaybackError::NothingLoaded)?;
            (inner.progress > self.config.previous_threshold_secs, current)
        };
        if restart {
            self.seek(0.0).await
        } else {
            self.play_track(current).await
        }
    }

    // ===== Modes =====

    pub async fn toggle_shuffle(&self) -> bool {
        let mut inner = self.inner.lock().await;
        inner.shuffle = !inner.shuffle;
        inner.shuffle
    }

    pub async fn cycle_repeat(&self) -> RepeatMode {
        let mut inner = self.inner.lock().await;
        inner.repeat = inner.repeat.cycle();
        inner.repeat
    }

    // ===== Observation =====

    pub async fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.inner.lock().await;
        PlayerSnapshot {
            track: inner.current.clone(),
            transport: inner.transport,
            progress_secs: inner.progress,
            duration_secs: inner.duration,
            volume: inner.volume,
            queue: inner.queue.clone(),
            shuffle: inner.shuffle,
            repeat: inner.repeat,
            pending_player: inner.pending.is_some(),
        }
    }

    // ===== Host player events =====

    async fn run_player_events(self, mut rx: mpsc::Receiver<PlayerEvent>, generation: u64) {
        while let Some(event) = rx.recv().await {
            if self.inner.lock().await.generation != generation {
                return;
            }
            match event {
                PlayerEvent::Ready => self.on_ready(generation).await,
                PlayerEvent::StateChanged(state) => self.on_state_changed(state, generation).await,
                PlayerEvent::Failed { code } => {
                    self.on_failed(code, generation).await;
                    return;
                }
            }
        }
    }

    async fn on_ready(&self, generation: u64) {
        let (player, volume) = {
            let inner = self.inner.lock().await;
            if inner.generation != generation {
                return;
            }
            match &inner.player {
                Some(player) => (player.clone(), inner.volume),
                None => return,
            }
        };

        if let Err(e) = player.set_volume(volume).await {
            warn!(error = %e, "failed to apply volume to fresh player");
        }
        if let Err(e) = player.play().await {
            warn!(error = %e, "failed to start playback");
        }
        let duration = player.duration().await.unwrap_or(0.0);

        let track_id = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return;
            }
            inner.duration = duration;
            inner.transport = Transport::Playing;
            self.start_poller(&mut inner, generation);
            inner.current.as_ref().map(|t| t.id.clone())
        };
        if let Some(track_id) = track_id {
            info!(%track_id, duration_secs = duration, "playback started");
            self.emit(PlaybackEvent::Started { track_id });
        }
    }

    async fn on_state_changed(&self, state: HostPlayerState, generation: u64) {
        match state {
            HostPlayerState::Playing => {
                // Refresh the duration; some hosts only know it once decoding
                // has actually started.
                let player = {
                    let inner = self.inner.lock().await;
                    if inner.generation != generation {
                        return;
                    }
                    inner.player.clone()
                };
                let duration = match &player {
                    Some(player) => player.duration().await.unwrap_or(0.0),
                    None => 0.0,
                };

                let event = {
                    let mut inner = self.inner.lock().await;
                    if inner.generation != generation {
                        return;
                    }
                    let was = inner.transport;
                    inner.transport = Transport::Playing;
                    if duration > 0.0 {
                        inner.duration = duration;
                    }
                    match was {
                        Transport::Playing => None,
                        Transport::Paused => {
                            inner.current.as_ref().map(|t| PlaybackEvent::Resumed {
                                track_id: t.id.clone(),
                                position_secs: inner.progress,
                            })
                        }
                        _ => inner.current.as_ref().map(|t| PlaybackEvent::Started {
                            track_id: t.id.clone(),
                        }),
                    }
                };
                if let Some(event) = event {
                    self.emit(event);
                }
            }
            HostPlayerState::Paused => {
                let event = {
                    let mut inner = self.inner.lock().await;
                    if inner.generation != generation || inner.transport == Transport::Paused {
                        return;
                    }
                    inner.transport = Transport::Paused;
                    inner.current.as_ref().map(|t| PlaybackEvent::Paused {
                        track_id: t.id.clone(),
                        position_secs: inner.progress,
                    })
                };
                if let Some(event) = event {
                    self.emit(event);
                }
            }
            HostPlayerState::Ended => self.handle_track_end(generation).await,
            HostPlayerState::Buffering | HostPlayerState::Unstarted => {}
        }
    }

    async fn on_failed(&self, code: u16, generation: u64) {
        let track_id = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return;
            }
            inner.transport = Transport::Idle;
            inner.current.as_ref().map(|t| t.id.clone())
        };
        warn!(?track_id, code, "host player failed");
        self.emit(PlaybackEvent::Error {
            track_id,
            message: format!("host player failed with code {code}"),
            recoverable: false,
        });
    }

    /// Decides what happens when the current track finishes: repeat-one
    /// restarts in place, otherwise the queue wins, then repeat-all replays
    /// the current track, and finally playback ends.
    async fn handle_track_end(&self, generation: u64) {
        enum Advance {
            Restart,
            Queue,
            Replay(Track),
            Stop(Option<String>),
        }

        let advance = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return;
            }
            if inner.repeat == RepeatMode::One {
                Advance::Restart
            } else if !inner.queue.is_empty() {
                Advance::Queue
            } else if let (RepeatMode::All, Some(track)) = (inner.repeat, inner.current.clone()) {
                Advance::Replay(track)
            } else {
                inner.transport = Transport::Ended;
                Advance::Stop(inner.current.as_ref().map(|t| t.id.clone()))
            }
        };

        match advance {
            Advance::Restart => {
                let player = {
                    let inner = self.inner.lock().await;
                    if inner.generation != generation {
                        return;
                    }
                    inner.player.clone()
                };
                let Some(player) = player else { return };
                if let Err(e) = player.seek(0.0).await {
                    warn!(error = %e, "repeat-one restart seek failed");
                }
                if let Err(e) = player.play().await {
                    warn!(error = %e, "repeat-one restart play failed");
                }
                let mut inner = self.inner.lock().await;
                if inner.generation == generation {
                    inner.progress = 0.0;
                    inner.transport = Transport::Playing;
                }
            }
            Advance::Queue => {
                if let Err(e) = self.next().await {
                    warn!(error = %e, "failed to advance to next queued track");
                }
            }
            Advance::Replay(track) => {
                if let Err(e) = self.play_track(track).await {
                    warn!(error = %e, "repeat-all replay failed");
                }
            }
            Advance::Stop(track_id) => {
                if let Some(track_id) = track_id {
                    info!(%track_id, "playback finished");
                    self.emit(PlaybackEvent::Ended { track_id });
                }
            }
        }
    }

    // ===== Position polling =====

    fn start_poller(&self, inner: &mut EngineInner, generation: u64) {
        if let Some(handle) = inner.poll_task.take() {
            handle.abort();
        }
        let engine = self.clone();
        let period = Duration::from_millis(self.config.poll_interval_ms.max(1));
        inner.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of an interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !engine.poll_position(generation).await {
                    return;
                }
            }
        }));
    }

    /// One poll cycle. Returns `false` when the poller should stop.
    async fn poll_position(&self, generation: u64) -> bool {
        let (player, needs_duration) = {
            let inner = self.inner.lock().await;
            if inner.generation != generation {
                return false;
            }
            match (&inner.player, inner.transport) {
                (Some(player), Transport::Playing) => (player.clone(), inner.duration <= 0.0),
                // Paused or ended: stay alive, position is not moving.
                (Some(_), _) => return true,
                (None, _) => return false,
            }
        };

        let position = match player.position().await {
            Ok(position) => position,
            Err(e) => {
                debug!(error = %e, "position poll failed");
                return true;
            }
        };
        // Some hosts report the duration late; keep asking until it shows up.
        let duration = if needs_duration {
            player.duration().await.unwrap_or(0.0)
        } else {
            0.0
        };

        let event = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return false;
            }
            if duration > 0.0 {
                inner.duration = duration;
            }
            let clamped = if inner.duration > 0.0 {
                position.clamp(0.0, inner.duration)
            } else {
                position.max(0.0)
            };
            inner.progress = clamped;
            inner.current.as_ref().map(|t| PlaybackEvent::PositionChanged {
                track_id: t.id.clone(),
                position_secs: clamped,
                duration_secs: inner.duration,
            })
        };
        if let Some(event) = event {
            self.emit(event);
        }
        true
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.emit(CoreEvent::Playback(event));
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine").finish_non_exhaustive()
    }
}
