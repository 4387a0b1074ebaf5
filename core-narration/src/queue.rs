//! # Queue Manager
//!
//! Fetch-ahead and gapless sequential playback over a chunk sequence, with
//! seek support.
//!
//! ## Overview
//!
//! The manager owns the chunk list, a cursor, a `playing` flag and at most one
//! live audio player. Audio for `[cursor, cursor + window)` is fetched
//! concurrently; playback itself is strictly serial:
//!
//! ```text
//!            ┌────────────── prefetch (concurrent) ──────────────┐
//!            ▼                                                   │
//!  chunk: [ Loaded ][ InFlight ][ Failed ][ NotRequested ] ...   │
//!            ▲                                                   │
//!         cursor ── play ── on_finish ── advance ── prefetch ────┘
//! ```
//!
//! ## Staleness
//!
//! Every completion hook captures the chunk index and the playback epoch
//! current when its player was created. `start`, `jump_to_chunk` and `stop`
//! bump the epoch, so a hook from superseded playback never moves the cursor
//! or emits an event.
//!
//! ## Locking
//!
//! Session state lives behind one `parking_lot::Mutex` that is never held
//! across an `.await`. Every continuation re-validates epoch, cursor and
//! player identity after re-acquiring it.
//!
//! ## Usage
//!
//! ```ignore
//! let config = QueueConfig::default();
//! let queue = QueueManager::new(texts, synthesizer, players, config, events.clone())?;
//! queue.start(0).await?;
//! queue.pause().await;
//! queue.jump_to_chunk(7).await?;
//! queue.resume().await;
//! queue.stop().await;
//! ```

use crate::chapter::build_chunk_texts;
use crate::chunk::{Chunk, ChunkPlayer, FetchState};
use crate::config::{QueueConfig, SegmenterConfig};
use crate::error::{NarrationError, Result};
use crate::synthesis::SpeechSynthesizer;
use bridge_traits::audio::{
    AudioPlayer, AudioPlayerFactory, AudioResource, PlayerCallbacks, PlayerError,
};
use bridge_traits::chapter::ChapterContent;
use core_async::sync::watch;
use core_async::task::Spawner;
use core_runtime::events::{EventBus, EventStream, NarrationEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Public Types
// ============================================================================

/// Coarse session state for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    /// Built but never started.
    Idle,
    Playing,
    /// Paused by the caller, by a seek while paused, or waiting for a user
    /// gesture.
    Paused,
    /// Stopped explicitly; the cursor is cleared.
    Stopped,
    /// The cursor ran past the last chunk.
    Completed,
}

/// Snapshot published to [`QueueManager::watch_status`] receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: QueueState,
    /// Times the session entered `Stopped` or `Completed`. A receiver that
    /// only sees the latest value still notices an ending this way.
    pub endings: u64,
}

/// Orchestrates prefetching and serial playback of one chunk sequence.
///
/// Cheap to clone; clones drive the same session.
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<Inner>,
}

// ============================================================================
// Internal State
// ============================================================================

type FetchJob = (usize, String);

struct Inner {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    players: Arc<dyn AudioPlayerFactory>,
    events: EventBus,
    config: QueueConfig,
    session: Mutex<Session>,
}

struct Session {
    chunks: Vec<Chunk>,
    /// `None` until started and after `stop`; `Some(len)` once exhausted.
    cursor: Option<usize>,
    playing: bool,
    epoch: u64,
    status: watch::Sender<PlaybackStatus>,
}

impl Session {
    fn state(&self) -> QueueState {
        self.status.borrow().state
    }

    fn set_state(&self, state: QueueState) {
        let ending = matches!(state, QueueState::Stopped | QueueState::Completed);
        self.status.send_if_modified(|status| {
            if status.state == state {
                return false;
            }
            status.state = state;
            if ending {
                status.endings += 1;
            }
            true
        });
    }

    fn is_current(&self, index: usize, epoch: u64) -> bool {
        self.epoch == epoch && self.cursor == Some(index)
    }

    fn owns(&self, index: usize, epoch: u64, player: &Arc<dyn AudioPlayer>) -> bool {
        self.is_current(index, epoch)
            && self
                .chunks
                .get(index)
                .and_then(|chunk| chunk.player.as_ref())
                .is_some_and(|bound| bound.is(player))
    }

    fn owned_player_mut(
        &mut self,
        index: usize,
        epoch: u64,
        player: &Arc<dyn AudioPlayer>,
    ) -> Option<&mut ChunkPlayer> {
        if !self.is_current(index, epoch) {
            return None;
        }
        self.chunks
            .get_mut(index)?
            .player
            .as_mut()
            .filter(|bound| bound.is(player))
    }

    /// Detach every player from every chunk.
    fn take_players(&mut self) -> Vec<Arc<dyn AudioPlayer>> {
        self.chunks
            .iter_mut()
            .filter_map(|chunk| chunk.player.take())
            .map(|bound| bound.player)
            .collect()
    }

    /// Mark chunks in `[cursor, cursor + window)` that need audio as in
    /// flight and return them for fetching.
    fn prefetch_jobs(&mut self, window: usize) -> Vec<FetchJob> {
        let Some(start) = self.cursor else {
            return Vec::new();
        };
        let len = self.chunks.len();
        if start >= len {
            return Vec::new();
        }
        let end = start.saturating_add(window).min(len);

        self.chunks[start..end]
            .iter_mut()
            .filter_map(|chunk| {
                chunk
                    .begin_fetch()
                    .then(|| (chunk.index(), chunk.text().to_string()))
            })
            .collect()
    }
}

/// What `play_next` does after inspecting the cursor.
enum Step {
    Done,
    Wait(watch::Receiver<FetchState>),
    Skip { index: usize, message: String },
    Play {
        index: usize,
        audio: AudioResource,
        text: String,
    },
}

/// Whether the playback loop keeps going after handling a chunk.
enum Flow {
    Continue,
    Done,
}

/// Player state observed right after `load` returned.
enum AfterLoad {
    Stale,
    Paused,
    Ready,
}

// ============================================================================
// Construction and Accessors
// ============================================================================

impl QueueManager {
    /// Build a session over `texts`.
    ///
    /// Rejects an empty list and blank chunk texts.
    pub fn new(
        texts: Vec<String>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        players: Arc<dyn AudioPlayerFactory>,
        config: QueueConfig,
        events: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        if texts.is_empty() {
            return Err(NarrationError::EmptySequence);
        }
        if let Some(index) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(NarrationError::EmptyChunk(index));
        }

        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(index, text))
            .collect::<Vec<_>>();

        debug!(
            chunks = chunks.len(),
            backend = players.name(),
            window = config.prefetch_window,
            "Narration session created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                synthesizer,
                players,
                events,
                config,
                session: Mutex::new(Session {
                    chunks,
                    cursor: None,
                    playing: false,
                    epoch: 0,
                    status: watch::channel(PlaybackStatus {
                        state: QueueState::Idle,
                        endings: 0,
                    })
                    .0,
                }),
            }),
        })
    }

    /// Build a session from a chapter, reading the title first when
    /// `include_title` is set.
    pub fn from_chapter(
        chapter: &ChapterContent,
        segmenter: &SegmenterConfig,
        include_title: bool,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        players: Arc<dyn AudioPlayerFactory>,
        config: QueueConfig,
        events: EventBus,
    ) -> Result<Self> {
        let texts = build_chunk_texts(chapter, segmenter, include_title)?;
        Self::new(texts, synthesizer, players, config, events)
    }

    /// Cursor position: `None` before `start` and after `stop`,
    /// `Some(total_chunks())` once every chunk has been played.
    pub fn current_index(&self) -> Option<usize> {
        self.inner.session.lock().cursor
    }

    pub fn total_chunks(&self) -> usize {
        self.inner.session.lock().chunks.len()
    }

    /// `round((cursor + 1) / len * 100)`, 0 when not started, at most 100.
    pub fn progress(&self) -> u32 {
        let session = self.inner.session.lock();
        let len = session.chunks.len();
        match session.cursor {
            Some(index) if len > 0 => {
                let percent = ((index + 1) as f64 / len as f64 * 100.0).round() as u32;
                percent.min(100)
            }
            _ => 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.session.lock().playing
    }

    pub fn state(&self) -> QueueState {
        self.inner.session.lock().state()
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.inner.session.lock().status.borrow()
    }

    /// Receiver that wakes on every state change.
    pub fn watch_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.inner.session.lock().status.subscribe()
    }

    pub fn chunk_texts(&self) -> Vec<String> {
        self.inner
            .session
            .lock()
            .chunks
            .iter()
            .map(|chunk| chunk.text().to_string())
            .collect()
    }

    pub fn chunk_text(&self, index: usize) -> Option<String> {
        self.inner
            .session
            .lock()
            .chunks
            .get(index)
            .map(|chunk| chunk.text().to_string())
    }

    pub fn fetch_state(&self, index: usize) -> Option<FetchState> {
        self.inner
            .session
            .lock()
            .chunks
            .get(index)
            .map(Chunk::fetch_state)
    }

    /// Number of chunks currently holding a player. Never more than one.
    pub fn active_player_count(&self) -> usize {
        self.inner
            .session
            .lock()
            .chunks
            .iter()
            .filter(|chunk| chunk.has_player())
            .count()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> EventStream {
        self.inner.events.subscribe()
    }
}

// ============================================================================
// Control Operations
// ============================================================================

impl QueueManager {
    /// Start playing at `start_index`, tearing down any previous playback.
    ///
    /// Returns once the first playable chunk has started, playback is waiting
    /// for a user gesture, or the sequence was exhausted by failures. Only an
    /// out-of-range index is an error.
    #[instrument(skip(self))]
    pub async fn start(&self, start_index: usize) -> Result<()> {
        let inner = &self.inner;
        let (stale, epoch, jobs) = {
            let mut session = inner.session.lock();
            let len = session.chunks.len();
            if start_index >= len {
                return Err(NarrationError::InvalidIndex {
                    index: start_index,
                    len,
                });
            }

            session.epoch += 1;
            session.cursor = Some(start_index);
            session.playing = true;
            session.set_state(QueueState::Playing);
            let stale = session.take_players();
            let jobs = session.prefetch_jobs(inner.config.prefetch_window);
            (stale, session.epoch, jobs)
        };

        info!(start_index, "Starting narration");
        teardown(stale).await;
        inner.spawn_fetches(jobs);
        Arc::clone(inner).play_next(epoch).await;
        Ok(())
    }

    /// Pause the current chunk's player. The cursor does not move.
    pub async fn pause(&self) {
        let player = {
            let mut session = self.inner.session.lock();
            session.playing = false;
            if session.state() == QueueState::Playing {
                session.set_state(QueueState::Paused);
            }
            session
                .cursor
                .and_then(|index| session.chunks.get(index))
                .and_then(|chunk| chunk.player.as_ref())
                .filter(|bound| bound.loaded)
                .map(|bound| Arc::clone(&bound.player))
        };

        debug!("Pausing narration");
        if let Some(player) = player {
            if let Err(e) = player.pause().await {
                warn!(error = %e, "Failed to pause player");
            }
        }
    }

    /// Resume the current chunk's player, or restart playback at the cursor
    /// when no player is left (e.g. the chunk ended or failed while paused).
    pub async fn resume(&self) {
        enum Action {
            Nothing,
            Replay {
                index: usize,
                epoch: u64,
                player: Arc<dyn AudioPlayer>,
            },
            Restart {
                epoch: u64,
                jobs: Vec<FetchJob>,
            },
        }

        let inner = &self.inner;
        let action = {
            let mut session = inner.session.lock();
            match session.cursor {
                Some(index) if index < session.chunks.len() => {
                    session.playing = true;
                    session.set_state(QueueState::Playing);
                    match session.chunks[index].player.as_ref() {
                        Some(bound) if bound.loaded => Action::Replay {
                            index,
                            epoch: bound.epoch,
                            player: Arc::clone(&bound.player),
                        },
                        // Still loading; the load continuation sees `playing`
                        // and starts it.
                        Some(_) => Action::Nothing,
                        None => {
                            session.epoch += 1;
                            let jobs = session.prefetch_jobs(inner.config.prefetch_window);
                            Action::Restart {
                                epoch: session.epoch,
                                jobs,
                            }
                        }
                    }
                }
                _ => {
                    debug!("Nothing to resume");
                    Action::Nothing
                }
            }
        };

        match action {
            Action::Nothing => {}
            Action::Replay {
                index,
                epoch,
                player,
            } => {
                debug!(index, "Resuming player");
                if let Flow::Continue = inner.play_loaded(index, epoch, &player).await {
                    Arc::clone(inner).play_next(epoch).await;
                }
            }
            Action::Restart { epoch, jobs } => {
                debug!("Restarting playback at cursor");
                inner.spawn_fetches(jobs);
                Arc::clone(inner).play_next(epoch).await;
            }
        }
    }

    /// Tear down every player and clear the cursor. Idempotent.
    pub async fn stop(&self) {
        let (stale, changed) = {
            let mut session = self.inner.session.lock();
            let changed = session.state() != QueueState::Stopped;
            session.epoch += 1;
            session.playing = false;
            session.cursor = None;
            session.set_state(QueueState::Stopped);
            (session.take_players(), changed)
        };

        teardown(stale).await;
        if changed {
            info!("Narration stopped");
            self.inner.events.emit(NarrationEvent::Stopped);
        }
    }

    /// Move the cursor to `target`.
    ///
    /// If playback was active it continues at `target`; otherwise the session
    /// stays paused there until `resume()`. Out-of-range targets are rejected
    /// with no state change.
    #[instrument(skip(self))]
    pub async fn jump_to_chunk(&self, target: usize) -> Result<()> {
        let inner = &self.inner;
        let (stale, epoch, jobs, was_playing) = {
            let mut session = inner.session.lock();
            let len = session.chunks.len();
            if target >= len {
                return Err(NarrationError::InvalidIndex { index: target, len });
            }

            let was_playing = session.playing;
            session.epoch += 1;
            session.cursor = Some(target);
            session.set_state(if was_playing {
                QueueState::Playing
            } else {
                QueueState::Paused
            });
            let stale = session.take_players();
            let jobs = session.prefetch_jobs(inner.config.prefetch_window);
            (stale, session.epoch, jobs, was_playing)
        };

        debug!(target, was_playing, "Seeking");
        teardown(stale).await;
        inner.spawn_fetches(jobs);
        if was_playing {
            Arc::clone(inner).play_next(epoch).await;
        }
        Ok(())
    }
}

// ============================================================================
// Fetching
// ============================================================================

impl Inner {
    fn spawn_fetches(self: &Arc<Self>, jobs: Vec<FetchJob>) {
        for (index, text) in jobs {
            let inner = Arc::clone(self);
            core_async::spawn(async move {
                inner.fetch(index, text).await;
            });
        }
    }

    async fn fetch(self: Arc<Self>, index: usize, text: String) {
        debug!(index, "Fetching chunk audio");
        let result = self.synthesizer.synthesize(&text).await;

        let mut session = self.session.lock();
        let Some(chunk) = session.chunks.get_mut(index) else {
            return;
        };
        match result {
            Ok(audio) if !audio.is_empty() => {
                debug!(index, bytes = audio.len(), "Chunk audio ready");
                chunk.complete_fetch(audio);
            }
            Ok(_) => {
                warn!(index, "Synthesis returned no audio");
                chunk.fail_fetch("synthesis returned no audio");
            }
            Err(e) => {
                warn!(index, error = %e, "Chunk fetch failed");
                chunk.fail_fetch(e.to_string());
            }
        }
    }
}

// ============================================================================
// Sequential Playback
// ============================================================================

impl Inner {
    /// Play from the cursor until a chunk starts, playback pauses, or the
    /// sequence is exhausted. Returns early once `epoch` is superseded.
    async fn play_next(self: Arc<Self>, epoch: u64) {
        loop {
            let (step, jobs) = {
                let mut session = self.session.lock();
                self.next_step(&mut session, epoch)
            };
            self.spawn_fetches(jobs);

            match step {
                Step::Done => return,
                Step::Wait(mut state) => {
                    if let Err(e) = state.wait_for(FetchState::is_settled).await {
                        debug!(error = %e, "Fetch state channel closed");
                    }
                }
                Step::Skip { index, message } => {
                    if !self.skip(index, epoch, message) {
                        return;
                    }
                }
                Step::Play { index, audio, text } => {
                    if let Flow::Done = self.start_chunk(index, epoch, audio, text).await {
                        return;
                    }
                }
            }
        }
    }

    fn next_step(&self, session: &mut Session, epoch: u64) -> (Step, Vec<FetchJob>) {
        if session.epoch != epoch || !session.playing {
            return (Step::Done, Vec::new());
        }
        let Some(index) = session.cursor else {
            return (Step::Done, Vec::new());
        };

        if index >= session.chunks.len() {
            session.playing = false;
            session.set_state(QueueState::Completed);
            info!("All chunks played");
            self.events.emit(NarrationEvent::AllComplete);
            return (Step::Done, Vec::new());
        }

        let chunk = &mut session.chunks[index];
        let step = match chunk.fetch_state() {
            FetchState::NotRequested => {
                chunk.begin_fetch();
                let job = (index, chunk.text().to_string());
                return (Step::Wait(chunk.watch_state()), vec![job]);
            }
            FetchState::InFlight => Step::Wait(chunk.watch_state()),
            FetchState::Failed => Step::Skip {
                index,
                message: chunk
                    .last_error()
                    .unwrap_or("synthesis failed")
                    .to_string(),
            },
            FetchState::Loaded => match chunk.audio() {
                Some(audio) if !audio.is_empty() => Step::Play {
                    index,
                    audio: audio.clone(),
                    text: chunk.text().to_string(),
                },
                _ => Step::Skip {
                    index,
                    message: "no audio for chunk".to_string(),
                },
            },
        };
        (step, Vec::new())
    }

    /// Report a broken chunk and move past it. Returns `false` if the epoch
    /// or cursor changed in the meantime.
    fn skip(self: &Arc<Self>, index: usize, epoch: u64, message: String) -> bool {
        let jobs = {
            let mut session = self.session.lock();
            if !session.is_current(index, epoch) {
                return false;
            }
            warn!(index, error = %message, "Skipping chunk");
            self.events.emit(NarrationEvent::Error {
                index: Some(index),
                message,
            });
            session.cursor = Some(index + 1);
            session.prefetch_jobs(self.config.prefetch_window)
        };
        self.spawn_fetches(jobs);
        true
    }

    /// Create, load and start the player for `index`.
    async fn start_chunk(
        self: &Arc<Self>,
        index: usize,
        epoch: u64,
        audio: AudioResource,
        text: String,
    ) -> Flow {
        let player = self.players.create();

        // Bound before `load` so a seek or stop during the load tears it down.
        let stale = {
            let mut session = self.session.lock();
            if !session.is_current(index, epoch) || !session.playing {
                return Flow::Done;
            }
            let stale = session.take_players();
            session.chunks[index].player = Some(ChunkPlayer::new(Arc::clone(&player), epoch));
            stale
        };
        teardown(stale).await;

        debug!(index, chars = text.chars().count(), "Loading chunk");
        let callbacks = self.callbacks(index, epoch);
        if let Err(e) = player.load(audio, callbacks, self.config.volume).await {
            return self.fail_player(index, epoch, &player, e).await;
        }

        let loaded = {
            let mut session = self.session.lock();
            let playing = session.playing;
            match session.owned_player_mut(index, epoch, &player) {
                None => AfterLoad::Stale,
                Some(bound) => {
                    bound.loaded = true;
                    if playing {
                        AfterLoad::Ready
                    } else {
                        AfterLoad::Paused
                    }
                }
            }
        };

        match loaded {
            AfterLoad::Stale => {
                player.unload().await;
                Flow::Done
            }
            AfterLoad::Paused => Flow::Done,
            AfterLoad::Ready => self.play_loaded(index, epoch, &player).await,
        }
    }

    /// Call `play()` on a loaded, bound player and announce the chunk the
    /// first time it becomes audible.
    async fn play_loaded(
        self: &Arc<Self>,
        index: usize,
        epoch: u64,
        player: &Arc<dyn AudioPlayer>,
    ) -> Flow {
        match player.play().await {
            Ok(()) => {
                let (paused_meanwhile, jobs) = {
                    let mut session = self.session.lock();
                    let playing = session.playing;
                    let text = session.chunks[index].text().to_string();
                    match session.owned_player_mut(index, epoch, player) {
                        None => return Flow::Done,
                        Some(_) if !playing => (true, Vec::new()),
                        Some(bound) => {
                            if !bound.announced {
                                bound.announced = true;
                                info!(index, "Chunk started");
                                self.events
                                    .emit(NarrationEvent::ChunkStarted { index, text });
                            }
                            session.set_state(QueueState::Playing);
                            (false, session.prefetch_jobs(self.config.prefetch_window))
                        }
                    }
                };

                if paused_meanwhile {
                    if let Err(e) = player.pause().await {
                        debug!(index, error = %e, "Re-pause after play failed");
                    }
                }
                self.spawn_fetches(jobs);
                Flow::Done
            }
            Err(e) if e.is_permission_denied() => {
                self.wait_for_interaction(index, epoch, player);
                Flow::Done
            }
            Err(e) => self.fail_player(index, epoch, player, e).await,
        }
    }

    /// Platform blocked playback until a user gesture: keep the player,
    /// pause the session.
    fn wait_for_interaction(&self, index: usize, epoch: u64, player: &Arc<dyn AudioPlayer>) {
        let mut session = self.session.lock();
        if !session.owns(index, epoch, player) {
            return;
        }
        session.playing = false;
        session.set_state(QueueState::Paused);
        info!(index, "Playback blocked until user interaction");
        self.events
            .emit(NarrationEvent::WaitingForInteraction { index });
    }

    /// Release a player that failed to load or play, report, and advance.
    async fn fail_player(
        self: &Arc<Self>,
        index: usize,
        epoch: u64,
        player: &Arc<dyn AudioPlayer>,
        error: PlayerError,
    ) -> Flow {
        let jobs = {
            let mut session = self.session.lock();
            if session.owns(index, epoch, player) {
                session.chunks[index].player = None;
                warn!(index, error = %error, "Chunk playback failed");
                self.events.emit(NarrationEvent::Error {
                    index: Some(index),
                    message: error.to_string(),
                });
                session.cursor = Some(index + 1);
                Some(session.prefetch_jobs(self.config.prefetch_window))
            } else {
                None
            }
        };

        player.unload().await;
        match jobs {
            Some(jobs) => {
                self.spawn_fetches(jobs);
                Flow::Continue
            }
            None => Flow::Done,
        }
    }
}

// ============================================================================
// Completion Hooks
// ============================================================================

impl Inner {
    fn callbacks(self: &Arc<Self>, index: usize, epoch: u64) -> PlayerCallbacks {
        let spawner = Spawner::current();
        let on_finish = {
            let spawner = spawner.clone();
            let inner = Arc::downgrade(self);
            move || {
                if let Some(inner) = inner.upgrade() {
                    spawner.spawn(inner.handle_finish(index, epoch));
                }
            }
        };
        let on_error = {
            let inner = Arc::downgrade(self);
            move |error: PlayerError| {
                if let Some(inner) = inner.upgrade() {
                    spawner.spawn(inner.handle_error(index, epoch, error));
                }
            }
        };
        PlayerCallbacks::from_fns(on_finish, on_error)
    }

    /// Detach the bound player of `index` if the hook is still current.
    fn release_current(
        &self,
        session: &mut Session,
        index: usize,
        epoch: u64,
    ) -> Option<Arc<dyn AudioPlayer>> {
        if !session.is_current(index, epoch) {
            return None;
        }
        let chunk = session.chunks.get_mut(index)?;
        if !chunk.player.as_ref().is_some_and(|bound| bound.epoch == epoch) {
            return None;
        }
        chunk.player.take().map(|bound| bound.player)
    }

    async fn handle_finish(self: Arc<Self>, index: usize, epoch: u64) {
        let finished = {
            let mut session = self.session.lock();
            match self.release_current(&mut session, index, epoch) {
                Some(player) => {
                    debug!(index, "Chunk finished");
                    self.events.emit(NarrationEvent::ChunkEnded { index });
                    session.cursor = Some(index + 1);
                    Some((player, session.prefetch_jobs(self.config.prefetch_window)))
                }
                None => None,
            }
        };

        let Some((player, jobs)) = finished else {
            debug!(index, epoch, "Ignoring stale finish");
            return;
        };
        player.unload().await;
        self.spawn_fetches(jobs);
        self.play_next(epoch).await;
    }

    async fn handle_error(self: Arc<Self>, index: usize, epoch: u64, error: PlayerError) {
        if error.is_permission_denied() {
            self.handle_blocked(index, epoch).await;
            return;
        }

        let failed = {
            let mut session = self.session.lock();
            match self.release_current(&mut session, index, epoch) {
                Some(player) => {
                    warn!(index, error = %error, "Player reported an error");
                    self.events.emit(NarrationEvent::Error {
                        index: Some(index),
                        message: error.to_string(),
                    });
                    session.cursor = Some(index + 1);
                    Some((player, session.prefetch_jobs(self.config.prefetch_window)))
                }
                None => None,
            }
        };

        let Some((player, jobs)) = failed else {
            debug!(index, epoch, "Ignoring stale player error");
            return;
        };
        player.unload().await;
        self.spawn_fetches(jobs);
        self.play_next(epoch).await;
    }

    /// The platform revoked playback mid-chunk. The player's hooks are spent,
    /// so it is released; `resume()` reloads the chunk from cached audio.
    async fn handle_blocked(&self, index: usize, epoch: u64) {
        let released = {
            let mut session = self.session.lock();
            let player = self.release_current(&mut session, index, epoch);
            if player.is_some() {
                session.playing = false;
                session.set_state(QueueState::Paused);
                info!(index, "Playback blocked until user interaction");
                self.events
                    .emit(NarrationEvent::WaitingForInteraction { index });
            }
            player
        };

        match released {
            Some(player) => player.unload().await,
            None => debug!(index, epoch, "Ignoring stale permission error"),
        }
    }
}

/// Stop and release detached players.
async fn teardown(players: Vec<Arc<dyn AudioPlayer>>) {
    for player in players {
        if let Err(e) = player.stop().await {
            debug!(error = %e, "Stop during teardown failed");
        }
        player.unload().await;
    }
}
