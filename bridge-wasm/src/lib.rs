//! WebAssembly Bridge Implementations
//!
//! This crate provides WebAssembly-compatible implementations of the bridge
//! traits defined in `bridge-traits`, built on browser APIs through `web-sys`
//! and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WasmHttpClient`: `fetch` with `AbortController` timeouts
//! - `HtmlAudioPlayer`: one `HtmlAudioElement` per chunk, fed from a `Blob`
//!   object URL; autoplay rejections surface as `PermissionDenied`
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::build_wasm_bridges;
//!
//! let bridges = build_wasm_bridges()?;
//! let synthesizer = HttpSynthesizer::new(bridges.http(), base_url, voice);
//! let queue = QueueManager::new(texts, Arc::new(synthesizer), bridges.players(), config, events)?;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod audio;
pub mod bootstrap;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use audio::{HtmlAudioPlayer, HtmlAudioPlayerFactory};
pub use bootstrap::{build_wasm_bridges, WasmBridgeSet};
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
