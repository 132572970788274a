//! Engine behavior tests driven by a scripted host player.
//!
//! The scripted factory records every provisioned player and keeps the event
//! senders around, so tests can act as the host: report ready, flip states
//! and end tracks at will.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::player::{
    HostPlayerState, MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerSettings,
};
use core_catalog::Track;
use core_playback::{PlaybackError, PlayerEngine, RepeatMode, Transport};
use core_runtime::events::EventBus;
use core_runtime::PlaybackConfig;
use tokio::sync::mpsc;

// ===== Harness =====

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Play,
    Pause,
    Seek(f64),
    SetVolume(u8),
    Destroy,
}

struct ScriptedPlayer {
    commands: Mutex<Vec<Command>>,
    position: Mutex<f64>,
    duration: Mutex<f64>,
}

impl ScriptedPlayer {
    fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            position: Mutex::new(0.0),
            duration: Mutex::new(duration),
        })
    }

    fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    fn set_position(&self, position: f64) {
        *self.position.lock().unwrap() = position;
    }

    fn set_duration(&self, duration: f64) {
        *self.duration.lock().unwrap() = duration;
    }
}

#[async_trait]
impl MediaPlayer for ScriptedPlayer {
    async fn play(&self) -> BridgeResult<()> {
        self.commands.lock().unwrap().push(Command::Play);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.commands.lock().unwrap().push(Command::Pause);
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> BridgeResult<()> {
        self.commands.lock().unwrap().push(Command::Seek(seconds));
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> BridgeResult<()> {
        self.commands.lock().unwrap().push(Command::SetVolume(volume));
        Ok(())
    }

    async fn position(&self) -> BridgeResult<f64> {
        Ok(*self.position.lock().unwrap())
    }

    async fn duration(&self) -> BridgeResult<f64> {
        Ok(*self.duration.lock().unwrap())
    }

    async fn destroy(&self) -> BridgeResult<()> {
        self.commands.lock().unwrap().push(Command::Destroy);
        Ok(())
    }
}

struct ScriptedFactory {
    available: Mutex<bool>,
    players: Mutex<Vec<Arc<ScriptedPlayer>>>,
    senders: Mutex<Vec<mpsc::Sender<PlayerEvent>>>,
    created_ids: Mutex<Vec<String>>,
}

impl ScriptedFactory {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            available: Mutex::new(true),
            players: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
            created_ids: Mutex::new(Vec::new()),
        })
    }

    fn set_available(&self, available: bool) {
        *self.available.lock().unwrap() = available;
    }

    fn player(&self, index: usize) -> Arc<ScriptedPlayer> {
        self.players.lock().unwrap()[index].clone()
    }

    fn created_ids(&self) -> Vec<String> {
        self.created_ids.lock().unwrap().clone()
    }

    async fn host_event(&self, index: usize, event: PlayerEvent) {
        let sender = self.senders.lock().unwrap()[index].clone();
        sender.send(event).await.unwrap();
        settle().await;
    }
}

#[async_trait]
impl MediaPlayerFactory for ScriptedFactory {
    async fn create(
        &self,
        media_id: &str,
        _settings: PlayerSettings,
        events: mpsc::Sender<PlayerEvent>,
    ) -> BridgeResult<Arc<dyn MediaPlayer>> {
        if !*self.available.lock().unwrap() {
            return Err(BridgeError::NotAvailable("player surface unmounted".into()));
        }
        let player = ScriptedPlayer::new(100.0);
        self.players.lock().unwrap().push(player.clone());
        self.senders.lock().unwrap().push(events);
        self.created_ids.lock().unwrap().push(media_id.to_string());
        Ok(player)
    }
}

/// Lets spawned engine tasks run to completion on the test runtime.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.into(),
        title: format!("Track {id}"),
        artist: "Artist".into(),
        thumbnail_url: String::new(),
        thumbnail_high_url: String::new(),
        description: String::new(),
        published_at: None,
        duration_secs: None,
    }
}

fn engine(factory: Arc<ScriptedFactory>) -> PlayerEngine {
    PlayerEngine::new(factory, EventBus::new(64), PlaybackConfig::default())
}

fn engine_with_poll(factory: Arc<ScriptedFactory>, poll_interval_ms: u64) -> PlayerEngine {
    let config = PlaybackConfig {
        poll_interval_ms,
        ..PlaybackConfig::default()
    };
    PlayerEngine::new(factory, EventBus::new(64), config)
}

// ===== Loading and readiness =====

#[tokio::test]
async fn ready_applies_volume_and_starts_playback() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    assert_eq!(engine.snapshot().await.transport, Transport::Loading);

    factory.host_event(0, PlayerEvent::Ready).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.transport, Transport::Playing);
    assert_eq!(snapshot.duration_secs, 100.0);
    assert_eq!(
        factory.player(0).commands(),
        vec![Command::SetVolume(50), Command::Play]
    );
}

#[tokio::test]
async fn switching_tracks_destroys_the_old_player() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.play_track(track("b")).await.unwrap();

    assert_eq!(factory.created_ids(), vec!["a", "b"]);
    assert!(factory.player(0).commands().contains(&Command::Destroy));
    assert_eq!(engine.snapshot().await.track.unwrap().id, "b");
}

#[tokio::test]
async fn stale_player_events_are_ignored_after_rapid_switch() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    engine.play_track(track("b")).await.unwrap();

    // The host reports the first player ready after it was already replaced.
    factory.host_event(0, PlayerEvent::Ready).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.track.unwrap().id, "b");
    assert_eq!(snapshot.transport, Transport::Loading);
    // The stale player never received transport commands.
    assert_eq!(factory.player(0).commands(), vec![Command::Destroy]);

    factory.host_event(1, PlayerEvent::Ready).await;
    assert_eq!(engine.snapshot().await.transport, Transport::Playing);
}

// ===== Deferred player surface =====

#[tokio::test]
async fn unavailable_surface_parks_the_track_until_retry() {
    let factory = ScriptedFactory::new();
    factory.set_available(false);
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.transport, Transport::Idle);
    assert!(snapshot.pending_player);
    assert!(factory.created_ids().is_empty());

    factory.set_available(true);
    engine.retry_pending().await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    let snapshot = engine.snapshot().await;
    assert!(!snapshot.pending_player);
    assert_eq!(snapshot.transport, Transport::Playing);
    assert_eq!(factory.created_ids(), vec!["a"]);
}

#[tokio::test]
async fn retry_without_pending_track_errors() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory);

    let err = engine.retry_pending().await.unwrap_err();
    assert!(matches!(err, PlaybackError::NothingPending));
}

// ===== Transport =====

#[tokio::test]
async fn pause_and_resume_round_trip() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());
    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    engine.pause().await.unwrap();
    assert_eq!(engine.snapshot().await.transport, Transport::Paused);

    engine.toggle_play().await.unwrap();
    assert_eq!(engine.snapshot().await.transport, Transport::Playing);

    let commands = factory.player(0).commands();
    assert!(commands.contains(&Command::Pause));
    assert_eq!(commands.iter().filter(|c| **c == Command::Play).count(), 2);
}

#[tokio::test]
async fn transport_commands_require_a_player() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory);

    assert!(matches!(
        engine.pause().await.unwrap_err(),
        PlaybackError::NothingLoaded
    ));
    assert!(matches!(
        engine.seek(10.0).await.unwrap_err(),
        PlaybackError::NothingLoaded
    ));
}

#[tokio::test]
async fn seek_clamps_to_duration() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());
    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    engine.seek(250.0).await.unwrap();
    assert_eq!(engine.snapshot().await.progress_secs, 100.0);
    assert!(factory.player(0).commands().contains(&Command::Seek(100.0)));

    engine.seek(-5.0).await.unwrap();
    assert_eq!(engine.snapshot().await.progress_secs, 0.0);
}

#[tokio::test]
async fn volume_is_clamped_and_survives_without_a_player() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    // No player yet: the level is stored for later.
    engine.set_volume(180).await.unwrap();
    assert_eq!(engine.snapshot().await.volume, 100);

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    // The remembered level was applied to the fresh player.
    assert!(factory.player(0).commands().contains(&Command::SetVolume(100)));

    engine.set_volume(30).await.unwrap();
    assert!(factory.player(0).commands().contains(&Command::SetVolume(30)));
}

// ===== Queue and advancement =====

#[tokio::test]
async fn ended_track_advances_through_queue_in_order() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.add_to_queue(track("b")).await;
    engine.add_to_queue(track("c")).await;

    factory
        .host_event(0, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;
    assert_eq!(factory.created_ids(), vec!["a", "b"]);
    factory.host_event(1, PlayerEvent::Ready).await;

    factory
        .host_event(1, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;
    assert_eq!(factory.created_ids(), vec!["a", "b", "c"]);
    assert!(engine.snapshot().await.queue.is_empty());
}

#[tokio::test]
async fn repeat_one_restarts_in_place_and_keeps_queue() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.add_to_queue(track("b")).await;

    assert_eq!(engine.cycle_repeat().await, RepeatMode::All);
    assert_eq!(engine.cycle_repeat().await, RepeatMode::One);

    factory
        .host_event(0, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;

    // Restarted the same player instead of provisioning a new one.
    assert_eq!(factory.created_ids(), vec!["a"]);
    assert!(factory.player(0).commands().contains(&Command::Seek(0.0)));
    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.transport, Transport::Playing);
    assert_eq!(snapshot.queue.len(), 1);
}

#[tokio::test]
async fn repeat_all_replays_current_when_queue_is_empty() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.cycle_repeat().await; // All

    factory
        .host_event(0, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;

    assert_eq!(factory.created_ids(), vec!["a", "a"]);
}

#[tokio::test]
async fn track_end_reloads_chain_across_generations() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.cycle_repeat().await; // All

    // Each replay is triggered from inside the previous player's event task.
    factory
        .host_event(0, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;
    factory.host_event(1, PlayerEvent::Ready).await;
    factory
        .host_event(1, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;

    assert_eq!(factory.created_ids(), vec!["a", "a", "a"]);
    assert_eq!(engine.snapshot().await.track.unwrap().id, "a");
}

#[tokio::test]
async fn ended_with_nothing_scheduled_stops() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    factory
        .host_event(0, PlayerEvent::StateChanged(HostPlayerState::Ended))
        .await;

    assert_eq!(engine.snapshot().await.transport, Transport::Ended);
    assert_eq!(factory.created_ids(), vec!["a"]);
}

#[tokio::test]
async fn next_on_empty_queue_is_a_no_op() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.next().await.unwrap();
    assert!(factory.created_ids().is_empty());
}

#[tokio::test]
async fn shuffle_next_still_consumes_one_queued_track() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.add_to_queue(track("b")).await;
    engine.add_to_queue(track("c")).await;
    assert!(engine.toggle_shuffle().await);

    engine.next().await.unwrap();

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.queue.len(), 1);
    let loaded = snapshot.track.unwrap().id;
    assert!(loaded == "b" || loaded == "c");
    // Whichever was loaded is no longer queued.
    assert!(!snapshot.queue.iter().any(|t| t.id == loaded));
}

#[tokio::test]
async fn shuffle_with_single_queued_track_always_picks_it() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.toggle_shuffle().await;
    engine.add_to_queue(track("only")).await;
    engine.next().await.unwrap();

    assert_eq!(engine.snapshot().await.track.unwrap().id, "only");
    assert!(engine.snapshot().await.queue.is_empty());
}

#[tokio::test]
async fn previous_restarts_or_reloads_by_threshold() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    // Deep into the track: restart in place.
    engine.seek(20.0).await.unwrap();
    engine.previous().await.unwrap();
    assert!(factory.player(0).commands().contains(&Command::Seek(0.0)));
    assert_eq!(factory.created_ids(), vec!["a"]);

    // Just started: reload the track from scratch.
    engine.previous().await.unwrap();
    assert_eq!(factory.created_ids(), vec!["a", "a"]);
}

// ===== Position polling =====

#[tokio::test(start_paused = true)]
async fn poller_tracks_and_clamps_position() {
    let factory = ScriptedFactory::new();
    let engine = engine_with_poll(factory.clone(), 1000);

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;

    factory.player(0).set_position(12.5);
    tokio::time::advance(Duration::from_millis(1001)).await;
    settle().await;
    assert_eq!(engine.snapshot().await.progress_secs, 12.5);

    // Hosts can briefly report past the end; the engine clamps.
    factory.player(0).set_position(160.0);
    tokio::time::advance(Duration::from_millis(1001)).await;
    settle().await;
    assert_eq!(engine.snapshot().await.progress_secs, 100.0);
}

#[tokio::test(start_paused = true)]
async fn poller_picks_up_a_late_reported_duration() {
    let factory = ScriptedFactory::new();
    let engine = engine_with_poll(factory.clone(), 1000);

    engine.play_track(track("a")).await.unwrap();
    // The host does not know the duration yet when it reports ready.
    factory.player(0).set_duration(0.0);
    factory.host_event(0, PlayerEvent::Ready).await;
    assert_eq!(engine.snapshot().await.duration_secs, 0.0);

    factory.player(0).set_duration(180.0);
    factory.player(0).set_position(20.0);
    tokio::time::advance(Duration::from_millis(1001)).await;
    settle().await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.duration_secs, 180.0);
    assert_eq!(snapshot.progress_secs, 20.0);
}

#[tokio::test(start_paused = true)]
async fn poller_idles_while_paused() {
    let factory = ScriptedFactory::new();
    let engine = engine_with_poll(factory.clone(), 1000);

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Ready).await;
    engine.pause().await.unwrap();

    factory.player(0).set_position(42.0);
    tokio::time::advance(Duration::from_millis(3001)).await;
    settle().await;

    // Position does not move while paused.
    assert_eq!(engine.snapshot().await.progress_secs, 0.0);
}

// ===== Host failures =====

#[tokio::test]
async fn host_player_failure_surfaces_as_idle() {
    let factory = ScriptedFactory::new();
    let engine = engine(factory.clone());

    engine.play_track(track("a")).await.unwrap();
    factory.host_event(0, PlayerEvent::Failed { code: 150 }).await;

    assert_eq!(engine.snapshot().await.transport, Transport::Idle);
}
