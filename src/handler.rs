//! Handler capability consumed by a connection.
//!
//! Implement [`ConnectionHandler`] and hand an `Arc` of it to
//! [`Connection::new`](crate::Connection::new). Do not put connection-driving
//! logic in `Drop`: the handler must stay alive until `receive_disconnect`
//! has been called, which the `Arc` guarantees, and after that callback
//! returns the connection is fully quiesced.

use crate::datagram::Datagram;
use crate::error::FramelinkError;

/// Callbacks a connection delivers to its creator.
pub trait ConnectionHandler: Send + Sync {
    /// Called once per fully received frame, in arrival order. Never invoked
    /// concurrently for the same connection: the next read is not armed
    /// until this call returns.
    fn receive_datagram(&self, datagram: Datagram);

    /// Called exactly once when the connection is torn down.
    ///
    /// `cause` is `None` for a clean local disconnect with no explicit
    /// cause, otherwise it carries the originating error. A cause supplied
    /// to [`Connection::disconnect_with_cause`](crate::Connection::disconnect_with_cause)
    /// is reported here verbatim, not the channel-closed error the local
    /// shutdown induces in the in-flight read.
    fn receive_disconnect(&self, cause: Option<FramelinkError>);
}
