//! # framelink
//!
//! Connection-level transport core for servers that exchange
//! length-prefixed binary datagrams over plain TCP or TLS.
//!
//! ## Architecture
//!
//! - **Transport** ([`transport`]): one read/write surface over a plain
//!   `TcpStream` or a handshake-complete `tokio_rustls::TlsStream`.
//! - **Framing** ([`frame`]): `u16` little-endian length prefix followed by
//!   the payload bytes, plus the receive state machine driving exact-length
//!   reads.
//! - **Connection** ([`connection`]): owns the transport, runs the receive
//!   loop as a per-connection task, and guarantees the handler's disconnect
//!   notification fires exactly once with the correct cause.
//!
//! Listening, accepting, TLS configuration, and message semantics are the
//! caller's business: this crate takes an established stream and a
//! [`ConnectionHandler`] and moves datagrams.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use framelink::{Connection, ConnectionHandler, Datagram, Transport};
//!
//! let connection = Connection::new(Arc::new(MyHandler::default()));
//! connection.initialize(Transport::plain(stream)).await?;
//! connection.send(Datagram::copy_from_slice(b"hello")).await;
//! ```

pub mod connection;
pub mod datagram;
pub mod error;
pub mod frame;
pub mod handler;
pub mod transport;

pub use connection::Connection;
pub use datagram::Datagram;
pub use error::{FramelinkError, Result};
pub use frame::{MAX_PAYLOAD_LEN, PREFIX_LEN};
pub use handler::ConnectionHandler;
pub use transport::{Transport, TransportKind};
