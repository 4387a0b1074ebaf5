//! # Session Configuration
//!
//! Per-session value types derived from [`NarratorConfig`]. A session's
//! voice, bounds and window are fixed when it is built; changing any of them
//! means building a new session.

use crate::error::{NarrationError, Result};
use core_runtime::config::{NarratorConfig, MAX_SPEED, MIN_SPEED};
use serde::{Deserialize, Serialize};

/// Chunk size bounds, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// A chunk is flushed as soon as it reaches this length.
    #[serde(default = "default_min_size")]
    pub min_size: usize,

    /// A sentence is not appended if the chunk would grow past this length.
    /// Advisory: a single sentence longer than this is kept whole.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
        }
    }
}

impl SegmenterConfig {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        let config = Self { min_size, max_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 || self.min_size > self.max_size {
            return Err(NarrationError::InvalidBounds {
                min: self.min_size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}

impl From<&NarratorConfig> for SegmenterConfig {
    fn from(config: &NarratorConfig) -> Self {
        Self {
            min_size: config.min_chunk_chars,
            max_size: config.max_chunk_chars,
        }
    }
}

/// Voice parameters sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speed multiplier, `1.0` = normal.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Signed pitch offset in hertz.
    #[serde(default = "default_pitch_hz")]
    pub pitch_hz: i32,

    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            speed: default_speed(),
            pitch_hz: default_pitch_hz(),
            volume: default_volume(),
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> Result<()> {
        if self.voice.trim().is_empty() {
            return Err(NarrationError::Config("voice must not be empty".to_string()));
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(NarrationError::Config(format!(
                "speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(NarrationError::Config(
                "volume must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&NarratorConfig> for VoiceSettings {
    fn from(config: &NarratorConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            speed: config.speed,
            pitch_hz: config.pitch_hz,
            volume: config.volume,
        }
    }
}

/// Queue manager tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Chunks fetched ahead of, and including, the cursor.
    #[serde(default = "default_prefetch_window")]
    pub prefetch_window: usize,

    /// Volume applied to every player at load time.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            prefetch_window: default_prefetch_window(),
            volume: default_volume(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prefetch_window == 0 {
            return Err(NarrationError::Config(
                "prefetch_window must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(NarrationError::Config(
                "volume must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&NarratorConfig> for QueueConfig {
    fn from(config: &NarratorConfig) -> Self {
        Self {
            prefetch_window: config.prefetch_window,
            volume: config.volume,
        }
    }
}

fn default_min_size() -> usize {
    50
}

fn default_max_size() -> usize {
    300
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
