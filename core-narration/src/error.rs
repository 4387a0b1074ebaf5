//! # Narration Error Types
//!
//! Errors surfaced by the segmenter, the synthesis client and the queue
//! manager.
//!
//! Chunk-level failures (a fetch that failed, a player that refused to
//! decode) never reach callers as `Err`: the queue converts them into
//! [`NarrationEvent::Error`](core_runtime::events::NarrationEvent) and skips
//! forward. What remains here is invalid input, rejected before any state
//! changes, plus the error payloads carried inside those events.

use bridge_traits::audio::PlayerError;
use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors returned by narration operations.
#[derive(Error, Debug)]
pub enum NarrationError {
    // ========================================================================
    // Invalid Input
    // ========================================================================
    /// A session was constructed without any chunk.
    #[error("Cannot narrate an empty chunk sequence")]
    EmptySequence,

    /// Chunk text at `index` is blank.
    #[error("Chunk {0} has no speakable text")]
    EmptyChunk(usize),

    /// Start or seek target outside `0..len`.
    #[error("Chunk index {index} out of range (sequence has {len} chunks)")]
    InvalidIndex { index: usize, len: usize },

    /// Segmenter bounds with `min > max` or a zero maximum.
    #[error("Invalid chunk bounds: min {min}, max {max}")]
    InvalidBounds { min: usize, max: usize },

    /// Source text produced no sentences at all.
    #[error("Text contains no speakable sentences")]
    EmptyText,

    // ========================================================================
    // Collaborator Failures
    // ========================================================================
    /// Fetching synthesized audio failed.
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The audio backend rejected an operation.
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Session configuration rejected.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NarrationError {
    /// Returns `true` for errors caused by the caller's arguments; these are
    /// rejected with no state mutation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            NarrationError::EmptySequence
                | NarrationError::EmptyChunk(_)
                | NarrationError::InvalidIndex { .. }
                | NarrationError::InvalidBounds { .. }
                | NarrationError::EmptyText
        )
    }
}

/// Result type for narration operations.
pub type Result<T> = std::result::Result<T, NarrationError>;

/// Errors from the speech synthesis endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The request never produced a response (connection refused, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Synthesis service returned HTTP {status}")]
    Status { status: u16 },

    /// The response body was empty or could not be decoded.
    #[error("Malformed synthesis response: {0}")]
    MalformedPayload(String),

    /// A voice parameter could not be encoded into a request.
    #[error("Invalid synthesis parameter: {0}")]
    InvalidParameter(String),
}

impl SynthesisError {
    /// Returns `true` if a later retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SynthesisError::Transport(_) => true,
            SynthesisError::Status { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for synthesis requests.
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

impl From<BridgeError> for SynthesisError {
    fn from(err: BridgeError) -> Self {
        SynthesisError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_classification() {
        assert!(NarrationError::EmptySequence.is_invalid_input());
        assert!(NarrationError::InvalidIndex { index: 9, len: 3 }.is_invalid_input());
        let upstream = NarrationError::Synthesis(SynthesisError::Status { status: 500 });
        assert!(!upstream.is_invalid_input());
    }

    #[test]
    fn transient_statuses() {
        assert!(SynthesisError::Status { status: 503 }.is_transient());
        assert!(SynthesisError::Status { status: 429 }.is_transient());
        assert!(!SynthesisError::Status { status: 400 }.is_transient());
        assert!(SynthesisError::Transport("reset".into()).is_transient());
        assert!(!SynthesisError::MalformedPayload("empty".into()).is_transient());
    }

    #[test]
    fn index_error_message_names_bounds() {
        let err = NarrationError::InvalidIndex { index: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "Chunk index 7 out of range (sequence has 5 chunks)"
        );
    }
}
