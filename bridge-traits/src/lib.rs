//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the narration core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that is implemented differently per platform
//! (desktop, web).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//! - [`AudioPlayer`](audio::AudioPlayer) - One play/pause/stop/unload lifecycle
//!   around one synthesized audio resource
//! - [`AudioPlayerFactory`](audio::AudioPlayerFactory) - Creates players for the
//!   platform selected at startup
//! - [`ChapterProvider`](chapter::ChapterProvider) - Website-specific chapter
//!   retrieval
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | HTTP | Audio |
//! |----------|---------------------|------|-------|
//! | Desktop  | `bridge-desktop`    | reqwest | rodio (`native-audio`) |
//! | Web      | `bridge-wasm`       | fetch | `HtmlAudioElement` |
//!
//! ## Thread Safety
//!
//! On native targets all bridge traits require `Send + Sync` (see
//! [`platform::PlatformSendSync`]); on `wasm32` the bounds are dropped because
//! browser objects are single-threaded.

pub mod audio;
pub mod chapter;
pub mod error;
pub mod http;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{
    AudioPlayer, AudioPlayerFactory, AudioResource, CallbackSlot, PlayerCallbacks, PlayerError,
    PlayerResult,
};
pub use chapter::{ChapterContent, ChapterProvider};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
