//! greenzmq Error Types
//!
//! Would-block never shows up here on blocking calls: the retry loop absorbs
//! it. Everything else surfaces at the call that produced it.

use std::io;

use greenzmq_core::{Direction, SyncError};
use thiserror::Error;

use crate::socket_kind::SocketKind;

/// Main error type for green socket operations
#[derive(Error, Debug)]
pub enum Error {
    /// Direction not permitted for this socket kind
    #[error("{direction} is not supported on {kind} sockets")]
    Unsupported { kind: SocketKind, direction: Direction },

    /// Error reported by libzmq, passed through unchanged
    ///
    /// On no-block calls this includes `EAGAIN`.
    #[error("ZeroMQ error: {0}")]
    Protocol(#[from] zmq::Error),

    /// The readiness wait itself failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Lock or gate misuse
    #[error("Coordination error: {0}")]
    Sync(SyncError),

    /// Socket closed, possibly while the call was blocked
    #[error("Socket closed")]
    Closed,
}

/// Result type alias for green socket operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Closed => Self::Closed,
            other => Self::Sync(other),
        }
    }
}

impl Error {
    /// The `EAGAIN` returned by no-block calls that could not proceed
    #[must_use]
    pub const fn would_block() -> Self {
        Self::Protocol(zmq::Error::EAGAIN)
    }

    /// Check if this is the `EAGAIN` of a no-block call
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::Protocol(zmq::Error::EAGAIN))
    }

    /// Check if this error points at a bug in the adapter or its caller
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Sync(err) if err.is_fatal())
    }

    /// Check if the socket is gone
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::Protocol(zmq::Error::ETERM))
    }
}
