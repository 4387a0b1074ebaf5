//! # Desktop Bridge Implementations
//!
//! Implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `AudioPlayerFactory` using `rodio` (feature `native-audio`)
//!
//! ## Feature Flags
//!
//! - `native-audio`: Enable speaker output through `rodio`. Off by default so
//!   headless builds (CI, servers) do not need an audio backend.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, RodioPlayerFactory};
//! use core_narration::{HttpSynthesizer, VoiceSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Arc::new(ReqwestHttpClient::new());
//!     let voice = VoiceSettings::default();
//!     let synthesizer = HttpSynthesizer::new(http, "http://localhost:5000", voice);
//!     let players = Arc::new(RodioPlayerFactory::new()?);
//!     // Hand both to a QueueManager
//!     Ok(())
//! }
//! ```

mod http;

#[cfg(feature = "native-audio")]
mod audio;

pub use http::ReqwestHttpClient;

#[cfg(feature = "native-audio")]
pub use audio::{RodioAudioPlayer, RodioPlayerFactory};
