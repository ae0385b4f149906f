//! Error types for framelink.

use thiserror::Error;

/// Main error type for all framelink operations.
///
/// A value of this type is also what a connection reports as its disconnect
/// cause: any I/O failure on the transport ends the connection, and the
/// originating error is delivered once through
/// [`ConnectionHandler::receive_disconnect`](crate::ConnectionHandler::receive_disconnect).
#[derive(Debug, Error)]
pub enum FramelinkError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the channel in the middle of a frame.
    ///
    /// The exact-length read contract guarantees full delivery or failure,
    /// so a truncated frame means the channel broke, not that the peer spoke
    /// a different protocol.
    #[error("broken pipe: channel closed mid-frame")]
    BrokenPipe,

    /// The channel was closed from our side while an operation was pending.
    ///
    /// This is the uninformative error a local disconnect induces in the
    /// in-flight read; the connection replaces it with the locally recorded
    /// cause before notifying the handler.
    #[error("connection closed")]
    ConnectionClosed,

    /// `initialize` was called on a connection that already has a transport.
    #[error("connection was already initialized")]
    AlreadyInitialized,
}

/// Result type alias using FramelinkError.
pub type Result<T> = std::result::Result<T, FramelinkError>;
