//! Shared test doubles for queue integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::audio::{
    AudioPlayer, AudioPlayerFactory, AudioResource, CallbackSlot, PlayerCallbacks, PlayerError,
    PlayerResult,
};
use core_narration::config::QueueConfig;
use core_narration::error::{SynthesisError, SynthesisResult};
use core_narration::queue::QueueManager;
use core_narration::synthesis::SpeechSynthesizer;
use core_runtime::events::{EventBus, EventStream, NarrationEvent};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Synthesizer
// ============================================================================

/// Returns the chunk text as the "audio" payload; fails for listed texts.
///
/// Gated texts hold their request open until [`FakeSynthesizer::open`].
#[derive(Default)]
pub struct FakeSynthesizer {
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeSynthesizer {
    pub fn failing_on(texts: impl IntoIterator<Item = String>) -> Self {
        Self {
            failing: texts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Requests for `text` block until the gate is opened.
    pub fn gate(&self, text: &str) {
        self.gates
            .lock()
            .insert(text.to_string(), Arc::new(Notify::new()));
    }

    /// Release one blocked (or the next) request for `text`.
    pub fn open(&self, text: &str) {
        if let Some(gate) = self.gates.lock().get(text) {
            gate.notify_one();
        }
    }

    pub fn calls_for(&self, text: &str) -> usize {
        self.calls.lock().get(text).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> SynthesisResult<AudioResource> {
        *self.calls.lock().entry(text.to_string()).or_default() += 1;
        let gate = self.gates.lock().get(text).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.contains(text) {
            return Err(SynthesisError::Status { status: 500 });
        }
        Ok(AudioResource::new(text.as_bytes().to_vec(), "audio/mpeg"))
    }
}

// ============================================================================
// Player
// ============================================================================

/// Scriptable player; finishes only when the test says so.
pub struct FakePlayer {
    slot: CallbackSlot,
    /// Copy of the callbacks that ignores the unload contract, for driving
    /// late hooks from a misbehaving backend.
    raw: Mutex<Option<PlayerCallbacks>>,
    resource: Mutex<Option<AudioResource>>,
    loaded: AtomicBool,
    unloaded: AtomicBool,
    playing: AtomicBool,
    deny_play: AtomicBool,
    fail_load: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl FakePlayer {
    fn new(deny_play: bool, fail_load: bool) -> Self {
        Self {
            slot: CallbackSlot::new(),
            raw: Mutex::new(None),
            resource: Mutex::new(None),
            loaded: AtomicBool::new(false),
            unloaded: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            deny_play: AtomicBool::new(deny_play),
            fail_load,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Text of the chunk this player was loaded with.
    pub fn text(&self) -> Option<String> {
        self.resource
            .lock()
            .as_ref()
            .map(|resource| String::from_utf8_lossy(&resource.data).into_owned())
    }

    /// Natural end of the resource. Returns `false` if the hook was already
    /// consumed or disarmed by `unload`.
    pub fn finish(&self) -> bool {
        self.playing.store(false, Ordering::SeqCst);
        self.slot.fire_finish()
    }

    pub fn fail(&self, error: PlayerError) -> bool {
        self.playing.store(false, Ordering::SeqCst);
        self.slot.fire_error(error)
    }

    /// Fire the finish hook even after unload.
    pub fn force_finish(&self) {
        let callbacks = self.raw.lock().clone();
        if let Some(callbacks) = callbacks {
            (callbacks.on_finish)();
        }
    }

    /// Fire the error hook even after unload.
    pub fn force_fail(&self, error: PlayerError) {
        let callbacks = self.raw.lock().clone();
        if let Some(callbacks) = callbacks {
            (callbacks.on_error)(error);
        }
    }

    pub fn is_live(&self) -> bool {
        self.loaded.load(Ordering::SeqCst) && !self.unloaded.load(Ordering::SeqCst)
    }

    pub fn is_playing_now(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }

    fn ensure_loaded(&self) -> PlayerResult<()> {
        if self.loaded.load(Ordering::SeqCst) && !self.unloaded.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PlayerError::NotLoaded)
        }
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn load(
        &self,
        resource: AudioResource,
        callbacks: PlayerCallbacks,
        _volume: f32,
    ) -> PlayerResult<()> {
        self.record("load");
        *self.resource.lock() = Some(resource);
        if self.fail_load {
            return Err(PlayerError::LoadFailed("unsupported format".to_string()));
        }
        *self.raw.lock() = Some(callbacks.clone());
        self.slot.arm(callbacks);
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn play(&self) -> PlayerResult<()> {
        self.record("play");
        self.ensure_loaded()?;
        if self.deny_play.swap(false, Ordering::SeqCst) {
            return Err(PlayerError::PermissionDenied("NotAllowedError".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> PlayerResult<()> {
        self.record("pause");
        self.ensure_loaded()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> PlayerResult<()> {
        self.record("stop");
        self.ensure_loaded()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn unload(&self) {
        self.record("unload");
        self.slot.disarm();
        self.playing.store(false, Ordering::SeqCst);
        self.unloaded.store(true, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakePlayerFactory {
    players: Mutex<Vec<Arc<FakePlayer>>>,
    deny_next_play: AtomicBool,
    fail_loads: AtomicBool,
}

impl FakePlayerFactory {
    /// The next player created rejects its first `play()` as gesture-blocked.
    pub fn deny_next_play(&self) {
        self.deny_next_play.store(true, Ordering::SeqCst);
    }

    /// Every player created from now on fails `load`.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn latest(&self) -> Arc<FakePlayer> {
        Arc::clone(self.players.lock().last().expect("no player created yet"))
    }

    pub fn created(&self) -> usize {
        self.players.lock().len()
    }

    pub fn player(&self, nth: usize) -> Arc<FakePlayer> {
        Arc::clone(&self.players.lock()[nth])
    }

    pub fn live_count(&self) -> usize {
        self.players.lock().iter().filter(|p| p.is_live()).count()
    }
}

impl AudioPlayerFactory for FakePlayerFactory {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn create(&self) -> Arc<dyn AudioPlayer> {
        let player = Arc::new(FakePlayer::new(
            self.deny_next_play.swap(false, Ordering::SeqCst),
            self.fail_loads.load(Ordering::SeqCst),
        ));
        self.players.lock().push(Arc::clone(&player));
        player
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn chunk_texts(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("Chunk number {i} is read aloud."))
        .collect()
}

pub struct Harness {
    pub queue: QueueManager,
    pub players: Arc<FakePlayerFactory>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub events: EventStream,
    pub texts: Vec<String>,
}

impl Harness {
    pub fn new(count: usize) -> Self {
        Self::with_failing(count, &[])
    }

    /// Session whose chunks at `failing` always fail to synthesize.
    pub fn with_failing(count: usize, failing: &[usize]) -> Self {
        let texts = chunk_texts(count);
        let synthesizer = Arc::new(FakeSynthesizer::failing_on(
            failing.iter().map(|&i| texts[i].clone()),
        ));
        let players = Arc::new(FakePlayerFactory::default());
        let bus = EventBus::default();
        let events = bus.subscribe();

        let queue = QueueManager::new(
            texts.clone(),
            synthesizer.clone(),
            players.clone(),
            QueueConfig::default(),
            bus,
        )
        .expect("valid session");

        Self {
            queue,
            players,
            synthesizer,
            events,
            texts,
        }
    }

    pub fn started(&self, index: usize) -> NarrationEvent {
        NarrationEvent::ChunkStarted {
            index,
            text: self.texts[index].clone(),
        }
    }

    pub async fn next_event(&mut self) -> NarrationEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event bus closed")
    }

    /// Collect events until one matches `last` (inclusive).
    pub async fn events_until<F>(&mut self, last: F) -> Vec<NarrationEvent>
    where
        F: Fn(&NarrationEvent) -> bool,
    {
        let mut seen = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = last(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    /// Let spawned fetches and hooks run, then return whatever was emitted.
    pub async fn settle(&mut self) -> Vec<NarrationEvent> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.events.drain()
    }
}
