//! Audio output using `rodio`.
//!
//! One output stream is opened per factory on a dedicated thread (the stream
//! handle is not `Send` on every host). Players connect a fresh `Sink` to the
//! stream's mixer for each load.
//!
//! `rodio` has no end-of-stream callback, so a watcher task polls the sink
//! while a load is live and fires `on_finish` once it drains during playback.

use async_trait::async_trait;
use bridge_traits::{
    audio::{
        AudioPlayer, AudioPlayerFactory, AudioResource, CallbackSlot, PlayerCallbacks,
        PlayerError, PlayerResult,
    },
    error::{BridgeError, Result},
};
use parking_lot::Mutex;
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often a live player checks whether its sink has drained.
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Output Stream
// ============================================================================

/// Keeps the output stream alive on its own thread until dropped.
struct OutputThread {
    mixer: Mixer,
    _shutdown: mpsc::Sender<()>,
}

impl OutputThread {
    fn open() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("narrator-audio-output".to_string())
            .spawn(move || match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(stream.mixer().clone()));
                    // Blocks until the factory drops its sender.
                    let _ = shutdown_rx.recv();
                    debug!("Closing audio output stream");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })
            .map_err(BridgeError::Io)?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| BridgeError::NotAvailable("audio output thread exited".to_string()))?
            .map_err(|e| BridgeError::NotAvailable(format!("no audio output device: {e}")))?;

        Ok(Self {
            mixer,
            _shutdown: shutdown_tx,
        })
    }
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    Ready,
    Playing,
    Paused,
    Stopped,
}

struct State {
    sink: Option<Arc<Sink>>,
    resource: Option<AudioResource>,
    phase: Phase,
    /// Bumped on every load and unload so a watcher from an older load exits.
    generation: u64,
}

/// A [`Sink`]-backed player for one resource at a time.
pub struct RodioAudioPlayer {
    mixer: Mixer,
    state: Arc<Mutex<State>>,
    slot: Arc<CallbackSlot>,
}

impl RodioAudioPlayer {
    fn new(mixer: Mixer) -> Self {
        Self {
            mixer,
            state: Arc::new(Mutex::new(State {
                sink: None,
                resource: None,
                phase: Phase::Empty,
                generation: 0,
            })),
            slot: Arc::new(CallbackSlot::new()),
        }
    }

    fn decode(resource: &AudioResource) -> PlayerResult<Decoder<Cursor<bytes::Bytes>>> {
        Decoder::new(Cursor::new(resource.data.clone()))
            .map_err(|e| PlayerError::LoadFailed(format!("{} ({})", e, resource.mime_type)))
    }

    fn spawn_watcher(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let slot = Arc::clone(&self.slot);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FINISH_POLL_INTERVAL);
            loop {
                ticker.tick().await;
                let drained = {
                    let mut state = state.lock();
                    if state.generation != generation {
                        return;
                    }
                    let drained = state.phase == Phase::Playing
                        && state.sink.as_ref().is_some_and(|sink| sink.empty());
                    if drained {
                        state.phase = Phase::Stopped;
                    }
                    drained
                };
                if drained {
                    debug!("Sink drained");
                    slot.fire_finish();
                    return;
                }
            }
        });
    }
}

#[async_trait]
impl AudioPlayer for RodioAudioPlayer {
    async fn load(
        &self,
        resource: AudioResource,
        callbacks: PlayerCallbacks,
        volume: f32,
    ) -> PlayerResult<()> {
        let source = Self::decode(&resource)?;

        let sink = Sink::connect_new(&self.mixer);
        sink.pause();
        sink.set_volume(volume.clamp(0.0, 1.0));
        sink.append(source);

        let generation = {
            let mut state = self.state.lock();
            if let Some(previous) = state.sink.take() {
                previous.stop();
            }
            state.generation += 1;
            state.sink = Some(Arc::new(sink));
            state.resource = Some(resource);
            state.phase = Phase::Ready;
            state.generation
        };

        self.slot.arm(callbacks);
        self.spawn_watcher(generation);
        Ok(())
    }

    async fn play(&self) -> PlayerResult<()> {
        let mut state = self.state.lock();
        let Some(sink) = state.sink.clone() else {
            return Err(PlayerError::NotLoaded);
        };

        if state.phase == Phase::Stopped && sink.empty() {
            let resource = state.resource.as_ref().ok_or(PlayerError::NotLoaded)?;
            sink.append(Self::decode(resource)?);
        }
        sink.play();
        state.phase = Phase::Playing;
        Ok(())
    }

    async fn pause(&self) -> PlayerResult<()> {
        let mut state = self.state.lock();
        let sink = state.sink.as_ref().ok_or(PlayerError::NotLoaded)?;
        sink.pause();
        if state.phase == Phase::Playing {
            state.phase = Phase::Paused;
        }
        Ok(())
    }

    async fn stop(&self) -> PlayerResult<()> {
        let mut state = self.state.lock();
        let sink = state.sink.as_ref().ok_or(PlayerError::NotLoaded)?;
        sink.stop();
        state.phase = Phase::Stopped;
        Ok(())
    }

    async fn unload(&self) {
        self.slot.disarm();
        let mut state = self.state.lock();
        if let Some(sink) = state.sink.take() {
            sink.stop();
        }
        state.resource = None;
        state.phase = Phase::Empty;
        state.generation += 1;
    }

    fn is_playing(&self) -> bool {
        let state = self.state.lock();
        state.phase == Phase::Playing && state.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Creates [`RodioAudioPlayer`]s sharing one output stream.
pub struct RodioPlayerFactory {
    output: OutputThread,
}

impl RodioPlayerFactory {
    /// Open the default output device.
    ///
    /// Fails with [`BridgeError::NotAvailable`] when the host has no usable
    /// audio device.
    pub fn new() -> Result<Self> {
        let output = OutputThread::open().inspect_err(|e| {
            warn!(error = %e, "Failed to open audio output");
        })?;
        info!("Audio output ready");
        Ok(Self { output })
    }
}

impl AudioPlayerFactory for RodioPlayerFactory {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn create(&self) -> Arc<dyn AudioPlayer> {
        Arc::new(RodioAudioPlayer::new(self.output.mixer.clone()))
    }
}
