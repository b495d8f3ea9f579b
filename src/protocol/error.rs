//! Protocol client error types.

use std::time::Duration;

use thiserror::Error;

use super::quote::UnquoteError;

/// Errors that can occur while talking to a NUT server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Dial, read or write failure on the underlying stream.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Connect or I/O deadline elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Response does not follow the list grammar.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A data line of a complete, well-framed reply could not be parsed.
    #[error("{0}")]
    MalformedItem(String),

    /// Device name cannot be sent as a command argument.
    #[error("invalid device name: {0:?}")]
    InvalidDevice(String),

    /// Server answered with `ERR <code>`.
    #[error("server error: {0}")]
    Server(String),

    /// A quoted value could not be unescaped.
    #[error("cannot decode value of '{variable}': {source}")]
    ValueDecode {
        /// Variable whose value failed to decode.
        variable: String,
        /// Underlying unquote failure.
        #[source]
        source: UnquoteError,
    },
}

impl ClientError {
    pub(crate) fn unexpected(expected: &str, got: &str) -> Self {
        Self::Protocol(format!("expected {expected:?}, got {got:?}"))
    }

    /// Whether the error came from the transport (dial, read, write, deadline).
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Whether the connection is still positioned at a reply boundary, so
    /// further commands on the same client can be trusted.
    ///
    /// `ERR` replies are single-line, malformed items and decode failures
    /// are detected after the whole frame was consumed, and invalid device
    /// names are rejected before anything is sent. Everything else leaves
    /// unread or half-read data on the stream.
    pub fn is_in_sync(&self) -> bool {
        matches!(
            self,
            Self::Server(_)
                | Self::ValueDecode { .. }
                | Self::MalformedItem(_)
                | Self::InvalidDevice(_)
        )
    }
}
