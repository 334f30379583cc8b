//! Error types for Gati

use thiserror::Error;

/// Gati error type
#[derive(Error, Debug)]
pub enum GatiError {
    /// Payload did not start with the telemetry magic
    #[error("Bad telemetry signature: {found:02x?}")]
    BadSignature { found: [u8; 4] },

    /// Payload too short or otherwise undecodable
    #[error("Decode error: {0}")]
    Decode(String),

    /// Stream peer closed before the declared length arrived
    #[error("Connection closed after {received} of {expected} bytes")]
    ConnectionClosed { expected: usize, received: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for GatiError {
    fn from(e: toml::de::Error) -> Self {
        GatiError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatiError>;
