//! Chunk state: text, fetch lifecycle, cached audio and the player slot.

use bridge_traits::audio::{AudioPlayer, AudioResource};
use core_async::sync::watch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fetch lifecycle of one chunk's synthesized audio.
///
/// `NotRequested → InFlight → Loaded | Failed`. A `Failed` chunk may go back
/// to `InFlight` on a later prefetch pass; `Loaded` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchState {
    NotRequested,
    InFlight,
    Loaded,
    Failed,
}

impl FetchState {
    /// `Loaded` or `Failed`: playback may decide what to do with the chunk.
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Loaded | FetchState::Failed)
    }

    /// Whether a prefetch pass should (re)request this chunk.
    pub fn needs_fetch(&self) -> bool {
        matches!(self, FetchState::NotRequested | FetchState::Failed)
    }
}

/// Player bound to a chunk, tagged with the playback epoch that created it.
#[derive(Clone)]
pub(crate) struct ChunkPlayer {
    pub player: Arc<dyn AudioPlayer>,
    pub epoch: u64,
    /// `load` has returned successfully.
    pub loaded: bool,
    /// `ChunkStarted` was emitted for this player.
    pub announced: bool,
}

impl ChunkPlayer {
    pub fn new(player: Arc<dyn AudioPlayer>, epoch: u64) -> Self {
        Self {
            player,
            epoch,
            loaded: false,
            announced: false,
        }
    }

    pub fn is(&self, player: &Arc<dyn AudioPlayer>) -> bool {
        Arc::ptr_eq(&self.player, player)
    }
}

/// One unit of text scheduled for independent synthesis and playback.
pub struct Chunk {
    index: usize,
    text: String,
    audio: Option<AudioResource>,
    last_error: Option<String>,
    state: watch::Sender<FetchState>,
    pub(crate) player: Option<ChunkPlayer>,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let (state, _) = watch::channel(FetchState::NotRequested);
        Self {
            index,
            text: text.into(),
            audio: None,
            last_error: None,
            state,
            player: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fetch_state(&self) -> FetchState {
        *self.state.borrow()
    }

    pub fn audio(&self) -> Option<&AudioResource> {
        self.audio.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Receiver that observes every fetch state transition.
    pub fn watch_state(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Mark the chunk `InFlight` if it needs fetching. Returns `false` for
    /// chunks already loaded or in flight.
    pub(crate) fn begin_fetch(&mut self) -> bool {
        if !self.fetch_state().needs_fetch() {
            return false;
        }
        self.last_error = None;
        self.state.send_replace(FetchState::InFlight);
        true
    }

    pub(crate) fn complete_fetch(&mut self, audio: AudioResource) {
        self.audio = Some(audio);
        self.last_error = None;
        self.state.send_replace(FetchState::Loaded);
    }

    pub(crate) fn fail_fetch(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.state.send_replace(FetchState::Failed);
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("index", &self.index)
            .field("chars", &self.text.chars().count())
            .field("fetch_state", &self.fetch_state())
            .field("has_player", &self.has_player())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_lifecycle() {
        let mut chunk = Chunk::new(0, "Hello there.");
        assert_eq!(chunk.fetch_state(), FetchState::NotRequested);

        assert!(chunk.begin_fetch());
        assert_eq!(chunk.fetch_state(), FetchState::InFlight);
        assert!(!chunk.begin_fetch());

        chunk.complete_fetch(AudioResource::new(vec![1u8, 2], "audio/mpeg"));
        assert_eq!(chunk.fetch_state(), FetchState::Loaded);
        assert_eq!(chunk.audio().map(AudioResource::len), Some(2));
    }

    #[test]
    fn loaded_chunk_is_never_refetched() {
        let mut chunk = Chunk::new(3, "Done.");
        chunk.begin_fetch();
        chunk.complete_fetch(AudioResource::new(vec![0u8], "audio/mpeg"));

        assert!(!chunk.begin_fetch());
        assert_eq!(chunk.fetch_state(), FetchState::Loaded);
    }

    #[test]
    fn failed_chunk_can_be_retried() {
        let mut chunk = Chunk::new(1, "Retry me.");
        chunk.begin_fetch();
        chunk.fail_fetch("HTTP 500");
        assert_eq!(chunk.last_error(), Some("HTTP 500"));

        assert!(chunk.begin_fetch());
        assert_eq!(chunk.fetch_state(), FetchState::InFlight);
        assert_eq!(chunk.last_error(), None);
    }

    #[tokio::test]
    async fn watchers_wake_when_fetch_settles() {
        let mut chunk = Chunk::new(0, "Wait for me.");
        chunk.begin_fetch();
        let mut rx = chunk.watch_state();

        let waiter = tokio::spawn(async move {
            let state = rx.wait_for(FetchState::is_settled).await.map(|s| *s);
            state.ok()
        });

        chunk.fail_fetch("timeout");
        assert_eq!(waiter.await.unwrap(), Some(FetchState::Failed));
    }
}
