//! Task spawning abstractions.
//!
//! - On native platforms: `tokio::task::spawn`, returning an awaitable
//!   `JoinHandle`
//! - On WASM: `wasm_bindgen_futures::spawn_local` on the browser event loop;
//!   the task is detached
//!
//! Callers in the narration core treat spawned tasks as fire-and-forget
//! continuations, so the handle is never required for correctness.

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::task::JoinHandle;

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a new asynchronous task on the Tokio runtime.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

#[cfg(not(target_arch = "wasm32"))]
/// Handle for spawning onto the runtime it was captured from.
///
/// Platform callbacks (e.g. an audio output thread reporting end of stream)
/// run outside the runtime, where [`spawn`] would panic. Capture a `Spawner`
/// while still inside async code and move it into the callback.
#[derive(Clone, Debug)]
pub struct Spawner {
    handle: tokio::runtime::Handle,
}

#[cfg(not(target_arch = "wasm32"))]
impl Spawner {
    /// Captures the current runtime. Must be called from within a Tokio
    /// runtime context.
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }

    /// Spawns a detached task on the captured runtime, from any thread.
    pub fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(future));
    }
}

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
/// Spawns a detached task on the browser's event loop.
pub fn spawn<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future)
}

#[cfg(target_arch = "wasm32")]
/// Spawner for the browser event loop; every callback already runs on it.
#[derive(Clone, Debug, Default)]
pub struct Spawner;

#[cfg(target_arch = "wasm32")]
impl Spawner {
    pub fn current() -> Self {
        Self
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + 'static,
    {
        wasm_bindgen_futures::spawn_local(future)
    }
}
