//! Audio player bridge traits and supporting types.
//!
//! A player owns exactly one playable audio resource for its whole lifetime:
//! it is created, loaded once, driven through play/pause/stop, and unloaded.
//! The narration core creates a fresh player per chunk through an
//! [`AudioPlayerFactory`] chosen once at startup, so it never branches on the
//! platform (native sound output vs. browser media element).

use crate::platform::{ErrorHook, FinishHook, PlatformSendSync};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default MIME type returned by the synthesis service.
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Errors reported by audio players.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The platform refused to start playback until the user interacts with
    /// the page/app (e.g. browser autoplay policy). Recoverable by a user
    /// gesture followed by `play()`.
    #[error("Playback not allowed until user interaction: {0}")]
    PermissionDenied(String),

    /// The resource could not be prepared for playback.
    #[error("Failed to load audio: {0}")]
    LoadFailed(String),

    /// Playback failed after the resource was loaded.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// A control call was made before `load` completed or after `unload`.
    #[error("No audio loaded")]
    NotLoaded,
}

impl PlayerError {
    /// Returns `true` for the gesture-blocked condition that callers should
    /// present as "tap to continue" rather than as an error.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PlayerError::PermissionDenied(_))
    }
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;

/// Synthesized audio payload handed from the fetch layer to a player.
///
/// `Bytes` is reference counted, so cloning a resource for a new player does
/// not copy the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioResource {
    pub data: Bytes,
    pub mime_type: String,
}

impl AudioResource {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioResource")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Completion hooks wired into a player at load time.
#[derive(Clone)]
pub struct PlayerCallbacks {
    pub on_finish: FinishHook,
    pub on_error: ErrorHook,
}

impl PlayerCallbacks {
    pub fn new(on_finish: FinishHook, on_error: ErrorHook) -> Self {
        Self {
            on_finish,
            on_error,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PlayerCallbacks {
    /// Wrap plain closures in the platform's shared hook type.
    pub fn from_fns<F, E>(on_finish: F, on_error: E) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        E: Fn(PlayerError) + Send + Sync + 'static,
    {
        Self::new(Arc::new(on_finish), Arc::new(on_error))
    }
}

#[cfg(target_arch = "wasm32")]
impl PlayerCallbacks {
    pub fn from_fns<F, E>(on_finish: F, on_error: E) -> Self
    where
        F: Fn() + 'static,
        E: Fn(PlayerError) + 'static,
    {
        Self::new(std::rc::Rc::new(on_finish), std::rc::Rc::new(on_error))
    }
}

impl fmt::Debug for PlayerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerCallbacks").finish_non_exhaustive()
    }
}

/// Holds a player's callbacks and enforces the delivery contract shared by
/// every backend: at most one completion (finish *or* error) per load, and
/// nothing after [`CallbackSlot::disarm`].
#[derive(Default)]
pub struct CallbackSlot {
    callbacks: Mutex<Option<PlayerCallbacks>>,
}

impl CallbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install callbacks for a new load, replacing any previous ones.
    pub fn arm(&self, callbacks: PlayerCallbacks) {
        *self.callbacks.lock() = Some(callbacks);
    }

    /// Drop the callbacks without invoking them.
    pub fn disarm(&self) {
        self.callbacks.lock().take();
    }

    pub fn is_armed(&self) -> bool {
        self.callbacks.lock().is_some()
    }

    /// Deliver the natural-finish notification. Returns `false` when the slot
    /// was already consumed or disarmed.
    pub fn fire_finish(&self) -> bool {
        // Taken before invoking so a re-entrant unload cannot observe it.
        let taken = self.callbacks.lock().take();
        match taken {
            Some(callbacks) => {
                (callbacks.on_finish)();
                true
            }
            None => false,
        }
    }

    /// Deliver an asynchronous playback failure.
    pub fn fire_error(&self, error: PlayerError) -> bool {
        let taken = self.callbacks.lock().take();
        match taken {
            Some(callbacks) => {
                (callbacks.on_error)(error);
                true
            }
            None => false,
        }
    }
}

/// Per-resource audio player.
///
/// Contract:
/// - `load` prepares the resource, applies the volume and wires the callbacks;
///   it never starts playback.
/// - `on_finish` fires at most once per successful full playback and never
///   after `unload`.
/// - `unload` releases the resource, is idempotent, and is safe to call when
///   `load` never completed.
/// - A single instance does not support overlapping `play` calls.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioPlayer: PlatformSendSync {
    /// Prepare `resource` for playback at `volume` (`0.0..=1.0`).
    async fn load(
        &self,
        resource: AudioResource,
        callbacks: PlayerCallbacks,
        volume: f32,
    ) -> PlayerResult<()>;

    /// Start or resume playback.
    async fn play(&self) -> PlayerResult<()>;

    /// Pause playback, keeping the position.
    async fn pause(&self) -> PlayerResult<()>;

    /// Stop playback and rewind.
    async fn stop(&self) -> PlayerResult<()>;

    /// Release the underlying resource. Infallible and idempotent.
    async fn unload(&self);

    /// Whether audio is currently audible.
    fn is_playing(&self) -> bool;
}

/// Creates fresh players; one factory is selected per platform at startup.
pub trait AudioPlayerFactory: PlatformSendSync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Create an unloaded player.
    fn create(&self) -> Arc<dyn AudioPlayer>;
}
