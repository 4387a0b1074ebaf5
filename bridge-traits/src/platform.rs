//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each target.
//!
//! Native targets require `Send + Sync` so bridge implementations can be shared
//! across async tasks and with audio output threads. WebAssembly builds run on
//! a single thread and cannot satisfy those bounds because browser objects
//! (`HtmlAudioElement`, `Blob`, ...) are not thread-safe.

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}

/// Callback invoked when a player reaches the natural end of its resource.
#[cfg(not(target_arch = "wasm32"))]
pub type FinishHook = std::sync::Arc<dyn Fn() + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type FinishHook = std::rc::Rc<dyn Fn()>;

/// Callback invoked when a player fails after `load` has returned.
#[cfg(not(target_arch = "wasm32"))]
pub type ErrorHook = std::sync::Arc<dyn Fn(crate::audio::PlayerError) + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type ErrorHook = std::rc::Rc<dyn Fn(crate::audio::PlayerError)>;
