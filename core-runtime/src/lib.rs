//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the narrator core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for narration notifications
//! - Chapter provider registry
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the narration core and host
//! applications share. It establishes the logging conventions, the
//! configuration defaults, and the event broadcasting used to report playback
//! progress to the UI layer.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use config::NarratorConfig;
pub use error::{Error, Result};
pub use events::{EventBus, EventStream, NarrationEvent};
pub use registry::ProviderRegistry;
