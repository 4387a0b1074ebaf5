//! Runtime-agnostic async abstraction layer for the narrator core.
//!
//! Core crates depend on this crate instead of depending on tokio directly:
//! - Native platforms (desktop): Tokio runtime
//! - WebAssembly: the browser event loop via `wasm-bindgen-futures`
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep and instants
//! - `sync`: Synchronization primitives (watch channels, cancellation)
//!
//! # Examples
//!
//! ```rust,no_run
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!     });
//! }
//! ```

pub mod sync;
pub mod task;
pub mod time;

pub use task::{spawn, Spawner};
pub use time::{sleep, Duration, Instant};
