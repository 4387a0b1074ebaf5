//! Time-related abstractions.
//!
//! - On native platforms: `tokio::time`
//! - On WASM: `gloo-timers` (browser `setTimeout`)

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::sleep;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use std::time::Duration;

#[cfg(target_arch = "wasm32")]
/// Sleeps for the specified duration using the browser's `setTimeout`.
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}

#[cfg(target_arch = "wasm32")]
/// Monotonic instant backed by `js_sys::Date::now()` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Instant(f64);

#[cfg(target_arch = "wasm32")]
impl Instant {
    pub fn now() -> Self {
        Self(js_now())
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(((js_now() - self.0) / 1000.0).max(0.0))
    }
}

#[cfg(target_arch = "wasm32")]
fn js_now() -> f64 {
    // performance.now() is unavailable in some worker contexts
    wasm_bindgen_futures::js_sys::Date::now()
}
