//! Dual-mode stream transport: plain TCP or TLS-wrapped TCP.
//!
//! [`Transport`] presents one read/write surface over either channel kind.
//! Ownership is structural: the `Secure` variant holds the
//! `tokio_rustls::TlsStream`, which itself owns the underlying `TcpStream`,
//! so there is never a second owning handle to the socket and teardown frees
//! each layer exactly once. The TLS handshake is assumed complete before a
//! stream is handed to this module.
//!
//! The enum implements `AsyncRead`/`AsyncWrite` by delegating to the active
//! variant, which lets a connection `tokio::io::split` it into exclusively
//! owned read and write halves.

use std::io::IoSlice;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsStream;

/// Which channel kind a transport carries. Decided at construction and
/// never changed for the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Plain TCP stream.
    Plain,
    /// TLS-wrapped TCP stream (handshake already complete).
    Secure,
}

/// An open, bidirectional byte channel, either plain or secured.
pub enum Transport {
    /// Directly owned TCP socket.
    Plain(TcpStream),
    /// TLS stream owning the TCP socket transitively.
    Secure(Box<TlsStream<TcpStream>>),
}

impl Transport {
    /// Wrap an established plain TCP stream.
    pub fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Wrap an established, handshake-complete TLS stream.
    pub fn secure(stream: TlsStream<TcpStream>) -> Self {
        Self::Secure(Box::new(stream))
    }

    /// The channel kind carried by this transport.
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Plain(_) => TransportKind::Plain,
            Self::Secure(_) => TransportKind::Secure,
        }
    }

    /// Reach the TCP socket at the bottom of the stack.
    fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(stream) => stream,
            Self::Secure(tls) => match tls.as_ref() {
                TlsStream::Client(stream) => stream.get_ref().0,
                TlsStream::Server(stream) => stream.get_ref().0,
            },
        }
    }

    /// Apply the channel options every connection runs with: keep-alive and
    /// no-delay on the underlying socket.
    pub fn configure(&self) -> std::io::Result<()> {
        let tcp = self.tcp();
        tcp.set_nodelay(true)?;
        socket2::SockRef::from(tcp).set_keepalive(true)?;
        Ok(())
    }

    /// Resolve the (remote, local) endpoints of the underlying socket.
    pub fn endpoints(&self) -> std::io::Result<(SocketAddr, SocketAddr)> {
        let tcp = self.tcp();
        Ok((tcp.peer_addr()?, tcp.local_addr()?))
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Transport::Secure(tls) => Pin::new(tls.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Transport::Secure(tls) => Pin::new(tls.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_write_vectored(cx, bufs),
            Transport::Secure(tls) => Pin::new(tls.as_mut()).poll_write_vectored(cx, bufs),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match self {
            Transport::Plain(stream) => stream.is_write_vectored(),
            Transport::Secure(tls) => tls.is_write_vectored(),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Transport::Secure(tls) => Pin::new(tls.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Transport::Secure(tls) => Pin::new(tls.as_mut()).poll_shutdown(cx),
        }
    }
}
