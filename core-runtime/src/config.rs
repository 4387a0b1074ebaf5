//! # Narrator Configuration
//!
//! Session-wide settings for synthesis and playback.
//!
//! ## Overview
//!
//! `NarratorConfig` holds the synthesis endpoint, the voice parameters and the
//! playback tuning knobs (prefetch window, chunk size bounds). Values come from
//! compiled-in defaults, optionally overlaid by environment variables, and are
//! validated fail-fast before a session is built.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::NarratorConfig;
//!
//! let config = NarratorConfig::from_env()?;
//! config.validate()?;
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `NARRATOR_TTS_URL` | `synthesis_url` |
//! | `NARRATOR_VOICE` | `voice` |
//! | `NARRATOR_SPEED` | `speed` |
//! | `NARRATOR_PITCH_HZ` | `pitch_hz` |
//! | `NARRATOR_VOLUME` | `volume` |
//! | `NARRATOR_PREFETCH_WINDOW` | `prefetch_window` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Slowest supported speaking speed multiplier.
pub const MIN_SPEED: f32 = 0.5;
/// Fastest supported speaking speed multiplier.
pub const MAX_SPEED: f32 = 2.0;

/// Narrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// Base URL of the speech synthesis service (without the `/speak` path).
    ///
    /// Default: `http://localhost:5000`.
    #[serde(default = "default_synthesis_url")]
    pub synthesis_url: String,

    /// Synthesis voice identifier.
    ///
    /// Default: `vi-VN-HoaiMyNeural`.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speaking speed multiplier (`1.0` = normal).
    ///
    /// Default: 1.5.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Pitch offset in hertz.
    ///
    /// Default: -10.
    #[serde(default = "default_pitch_hz")]
    pub pitch_hz: i32,

    /// Playback volume in `0.0..=1.0`, fixed for a session.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Number of chunks fetched ahead of (and including) the cursor.
    ///
    /// Default: 5.
    #[serde(default = "default_prefetch_window")]
    pub prefetch_window: usize,

    /// A chunk is flushed as soon as it reaches this many characters.
    ///
    /// Default: 50.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Sentences are not appended to a chunk past this many characters.
    ///
    /// Default: 300.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Per-request timeout for synthesis calls.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Whether the chapter title is read as its own first chunk.
    ///
    /// Default: true.
    #[serde(default = "default_include_title")]
    pub include_title: bool,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            synthesis_url: default_synthesis_url(),
            voice: default_voice(),
            speed: default_speed(),
            pitch_hz: default_pitch_hz(),
            volume: default_volume(),
            prefetch_window: default_prefetch_window(),
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
            request_timeout: default_request_timeout(),
            include_title: default_include_title(),
        }
    }
}

impl NarratorConfig {
    /// Defaults overlaid with `NARRATOR_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NARRATOR_TTS_URL") {
            config.synthesis_url = url;
        }
        if let Some(voice) = lookup("NARRATOR_VOICE") {
            config.voice = voice;
        }
        if let Some(speed) = parse_var(&lookup, "NARRATOR_SPEED")? {
            config.speed = speed;
        }
        if let Some(pitch) = parse_var(&lookup, "NARRATOR_PITCH_HZ")? {
            config.pitch_hz = pitch;
        }
        if let Some(volume) = parse_var(&lookup, "NARRATOR_VOLUME")? {
            config.volume = volume;
        }
        if let Some(window) = parse_var(&lookup, "NARRATOR_PREFETCH_WINDOW")? {
            config.prefetch_window = window;
        }

        Ok(config)
    }

    /// Validate configuration values, naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let url = self.synthesis_url.trim();
        if url.is_empty() {
            return Err(Error::Config("synthesis_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "synthesis_url must be an http(s) URL, got {}",
                url
            )));
        }

        if self.voice.trim().is_empty() {
            return Err(Error::Config("voice must not be empty".to_string()));
        }

        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(Error::Config(format!(
                "speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config("volume must be between 0.0 and 1.0".to_string()));
        }

        if self.prefetch_window == 0 {
            return Err(Error::Config("prefetch_window must be > 0".to_string()));
        }

        if self.min_chunk_chars > self.max_chunk_chars {
            return Err(Error::Config(
                "min_chunk_chars cannot exceed max_chunk_chars".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout must be > 0".to_string()));
        }

        Ok(())
    }

    /// `synthesis_url` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.synthesis_url.trim().trim_end_matches('/')
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::InvalidEnv {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_synthesis_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_voice() -> String {
    "vi-VN-HoaiMyNeural".to_string()
}

fn default_speed() -> f32 {
    1.5
}

fn default_pitch_hz() -> i32 {
    -10
}

fn default_volume() -> f32 {
    1.0
}

fn default_prefetch_window() -> usize {
    5
}

fn default_min_chunk_chars() -> usize {
    50
}

fn default_max_chunk_chars() -> usize {
    300
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_include_title() -> bool {
    true
}
