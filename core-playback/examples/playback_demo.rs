//! # Playback Engine Demo
//!
//! Drives the engine with a simulated host player that reports ready
//! immediately and "finishes" each track when told to, so the queue and
//! repeat behavior can be watched from the console.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::player::{MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerSettings};
use core_catalog::Track;
use core_playback::PlayerEngine;
use core_runtime::events::{CoreEvent, EventBus};
use core_runtime::PlaybackConfig;
use tokio::sync::mpsc;

// ============================================================================
// Simulated host player
// ============================================================================

struct ConsolePlayer {
    media_id: String,
    position: Mutex<f64>,
}

#[async_trait]
impl MediaPlayer for ConsolePlayer {
    async fn play(&self) -> BridgeResult<()> {
        println!("   [host] play {}", self.media_id);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        println!("   [host] pause {}", self.media_id);
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> BridgeResult<()> {
        println!("   [host] seek {} -> {seconds:.1}s", self.media_id);
        *self.position.lock().unwrap() = seconds;
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> BridgeResult<()> {
        println!("   [host] volume {volume}");
        Ok(())
    }

    async fn position(&self) -> BridgeResult<f64> {
        Ok(*self.position.lock().unwrap())
    }

    async fn duration(&self) -> BridgeResult<f64> {
        Ok(180.0)
    }

    async fn destroy(&self) -> BridgeResult<()> {
        println!("   [host] destroy {}", self.media_id);
        Ok(())
    }
}

struct ConsoleFactory {
    senders: Mutex<Vec<mpsc::Sender<PlayerEvent>>>,
}

impl ConsoleFactory {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            senders: Mutex::new(Vec::new()),
        })
    }

    /// Tells the engine the most recent player finished its track.
    async fn finish_current(&self) {
        let sender = self.senders.lock().unwrap().last().cloned();
        if let Some(sender) = sender {
            let _ = sender
                .send(PlayerEvent::StateChanged(
                    bridge_traits::player::HostPlayerState::Ended,
                ))
                .await;
        }
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl MediaPlayerFactory for ConsoleFactory {
    async fn create(
        &self,
        media_id: &str,
        _settings: PlayerSettings,
        events: mpsc::Sender<PlayerEvent>,
    ) -> BridgeResult<Arc<dyn MediaPlayer>> {
        println!("   [host] provisioning player for {media_id}");
        let ready = events.clone();
        self.senders.lock().unwrap().push(events);
        // A real host reports ready asynchronously once its surface loads.
        tokio::spawn(async move {
            let _ = ready.send(PlayerEvent::Ready).await;
        });
        Ok(Arc::new(ConsolePlayer {
            media_id: media_id.to_string(),
            position: Mutex::new(0.0),
        }))
    }
}

fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.into(),
        title: title.into(),
        artist: "Demo Artist".into(),
        thumbnail_url: String::new(),
        thumbnail_high_url: String::new(),
        description: String::new(),
        published_at: None,
        duration_secs: Some(180),
    }
}

// ============================================================================
// Main Demo
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🎵 Core Playback - Engine Demo\n");

    let events = EventBus::new(64);
    let mut stream = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = stream.recv().await {
            if let CoreEvent::Playback(playback) = event {
                println!("   [event] {playback:?}");
            }
        }
    });

    let factory = ConsoleFactory::new();
    let engine = PlayerEngine::new(factory.clone(), events, PlaybackConfig::default());

    println!("▶️  Loading first track and queueing two more...");
    engine
        .play_track(track("dQw4w9WgXcQ", "First Song"))
        .await
        .expect("load failed");
    engine.add_to_queue(track("abc123def45", "Second Song")).await;
    engine.add_to_queue(track("xyz987uvw65", "Third Song")).await;
    tokio::task::yield_now().await;

    println!("\n⏭  Track ends, queue advances...");
    factory.finish_current().await;
    tokio::task::yield_now().await;

    println!("\n🔁 Repeat-one keeps the current track...");
    engine.cycle_repeat().await; // all
    engine.cycle_repeat().await; // one
    factory.finish_current().await;

    println!("\n🎚  Transport controls...");
    engine.set_volume(75).await.expect("volume failed");
    engine.pause().await.expect("pause failed");
    engine.resume().await.expect("resume failed");
    engine.seek(30.0).await.expect("seek failed");

    let snapshot = engine.snapshot().await;
    println!("\n📊 Final state:");
    println!("   Track:   {:?}", snapshot.track.map(|t| t.title));
    println!("   State:   {:?}", snapshot.transport);
    println!("   Queue:   {} track(s)", snapshot.queue.len());
    println!("   Volume:  {}", snapshot.volume);
    println!("   Repeat:  {:?}", snapshot.repeat);

    println!("\n🎉 Demo completed!");
}
