//! Error handling for TN3270R
//!
//! One error enum covers the whole crate. Each variant is a stable kind that
//! callers can match on; the display text is for humans only.

use std::io;

use thiserror::Error;

/// Top-level error type for TN3270R operations
#[derive(Debug, Error)]
pub enum TN3270Error {
    /// Transport failure on the byte channel
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The host closed the connection
    #[error("connection closed by host")]
    ConnectionClosed,

    /// Telnet negotiation did not reach the 3270 data stream in time
    #[error("telnet negotiation timed out after {elapsed_ms} ms")]
    NegotiationTimeout { elapsed_ms: u64 },

    /// The screen buffer lock could not be acquired in time
    #[error("timed out after {timeout_ms} ms waiting for the screen buffer lock")]
    LockTimeout { timeout_ms: u64 },

    /// The host reply to an AID was not judged complete in time
    #[error("no complete host reply within {timeout_ms} ms")]
    CompletionTimeout { timeout_ms: u64 },

    /// Command byte rejected by the strict decoder
    #[error("invalid 3270 command byte 0x{byte:02X}")]
    InvalidCommand { byte: u8 },

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    /// PF or PA key number out of range
    #[error("invalid key: {key}")]
    InvalidKey { key: String },

    #[error("invalid configuration for '{parameter}': {reason}")]
    Config { parameter: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TN3270Error {
    /// Timeouts leave the session usable; the caller may retry
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NegotiationTimeout { .. } | Self::LockTimeout { .. } | Self::CompletionTimeout { .. }
        )
    }

    /// Transport errors end the session
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }

    pub fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for TN3270R operations
pub type Result<T> = std::result::Result<T, TN3270Error>;
