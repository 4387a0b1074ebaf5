//! Runtime errors: configuration and logging setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An environment override could not be parsed.
    #[error("Environment variable {key} is invalid ({value}): {reason}")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },

    /// The log filter was rejected or a global subscriber already exists.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
