//! # Narration Core
//!
//! Streams long-form text through a speech synthesis service and plays the
//! audio back chunk by chunk.
//!
//! ## Overview
//!
//! - [`segmenter`]: prose → sentences → bounded chunks
//! - [`synthesis`]: chunk text → audio via the synthesis service
//! - [`queue`]: prefetch window, serial gapless playback, pause/resume/seek
//! - [`sleep_timer`]: stop narration after a countdown
//! - [`chapter`]: chapter title and body → chunk texts
//!
//! Platform audio output and HTTP come in through the `bridge-traits`
//! capabilities; notifications go out on the `core-runtime` event bus.
//!
//! ```text
//! ChapterContent ─> segmenter ─> QueueManager ─┬─> SpeechSynthesizer (prefetch)
//!                                              ├─> AudioPlayerFactory (one live player)
//!                                              └─> EventBus (ChunkStarted, ChunkEnded, ...)
//! ```

pub mod chapter;
pub mod chunk;
pub mod config;
pub mod error;
pub mod queue;
pub mod segmenter;
pub mod sleep_timer;
pub mod synthesis;

pub use chapter::build_chunk_texts;
pub use chunk::{Chunk, FetchState};
pub use config::{QueueConfig, SegmenterConfig, VoiceSettings};
pub use error::{NarrationError, Result, SynthesisError, SynthesisResult};
pub use queue::{PlaybackStatus, QueueManager, QueueState};
pub use segmenter::{group_sentences_into_chunks, segment, split_into_sentences};
pub use sleep_timer::SleepTimer;
pub use synthesis::{format_pitch, format_rate, HttpSynthesizer, SpeechSynthesizer, VoiceInfo};
