//! Connection aggregate: transport ownership, receive loop, and the
//! exactly-once disconnect lifecycle.
//!
//! A [`Connection`] is created with a handler, then initialized exactly once
//! with an established [`Transport`]. Initialization applies socket options,
//! caches the endpoints, splits the transport, and spawns the receive loop
//! as a dedicated task. All mutation after that is serialized through small
//! non-reentrant critical sections plus that one task, so a handler callback
//! may freely call back into the connection without deadlocking.
//!
//! Every failure path funnels into a single disconnect coordinator guarded
//! by an explicit `Connected -> Disconnected` transition, which is what
//! makes `receive_disconnect` fire exactly once per connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tracing::{debug, warn};

use crate::datagram::Datagram;
use crate::error::{FramelinkError, Result};
use crate::frame::{write_frame, FrameReader, MAX_PAYLOAD_LEN};
use crate::handler::ConnectionHandler;
use crate::transport::Transport;

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Created, no transport yet.
    Idle,
    /// Transport set, receive loop running (or about to).
    Connected,
    /// Disconnect has been handled; the handler was (or is being) notified.
    Disconnected,
}

/// Lifecycle state, guarded by a mutex that is never held across an await
/// or a handler callback.
struct State {
    phase: Phase,
    /// Set when the disconnect was initiated from our side.
    local_disconnect: bool,
    /// Cause recorded by a local disconnect; reported instead of the
    /// channel-closed error the shutdown induces in the in-flight read.
    cause: Option<FramelinkError>,
    remote: Option<SocketAddr>,
    local: Option<SocketAddr>,
    /// Wakes the receive loop out of a pending read on local disconnect.
    shutdown: Option<oneshot::Sender<()>>,
}

/// A single peer connection exchanging length-prefixed datagrams.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use framelink::{Connection, Transport};
///
/// let connection = Connection::new(handler);
/// connection.initialize(Transport::plain(stream)).await?;
/// connection.send(datagram).await;
/// connection.disconnect().await;
/// ```
pub struct Connection {
    handler: Arc<dyn ConnectionHandler>,
    state: Mutex<State>,
    /// Write half of the split transport; one outstanding write at a time.
    writer: AsyncMutex<Option<WriteHalf<Transport>>>,
    /// Whether the transport is currently usable.
    open: AtomicBool,
}

impl Connection {
    /// Create a connection that will report to `handler`.
    ///
    /// No transport is attached yet; call [`initialize`](Self::initialize)
    /// with one to start receiving.
    pub fn new(handler: Arc<dyn ConnectionHandler>) -> Arc<Self> {
        Arc::new(Self {
            handler,
            state: Mutex::new(State {
                phase: Phase::Idle,
                local_disconnect: false,
                cause: None,
                remote: None,
                local: None,
                shutdown: None,
            }),
            writer: AsyncMutex::new(None),
            open: AtomicBool::new(false),
        })
    }

    /// Attach an established transport and start the receive loop.
    ///
    /// Applies keep-alive and no-delay to the underlying socket, resolves
    /// and caches the endpoints, then spawns the receive task. May be called
    /// exactly once; a second call returns
    /// [`FramelinkError::AlreadyInitialized`].
    ///
    /// Endpoint resolution failure is not propagated: the transport never
    /// produced data, so it is treated as an immediate disconnect and the
    /// handler is notified with the resolution error.
    pub async fn initialize(self: &Arc<Self>, transport: Transport) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.phase != Phase::Idle {
                return Err(FramelinkError::AlreadyInitialized);
            }
            state.phase = Phase::Connected;
        }

        if let Err(err) = transport.configure() {
            warn!(?err, "failed to apply socket options");
        }

        let (remote, local) = match transport.endpoints() {
            Ok(endpoints) => endpoints,
            Err(err) => {
                self.handle_disconnect(FramelinkError::Io(err)).await;
                return Ok(());
            }
        };
        debug!(kind = ?transport.kind(), %remote, %local, "connection initialized");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.remote = Some(remote);
            state.local = Some(local);
            state.shutdown = Some(shutdown_tx);
        }

        let (read_half, write_half) = tokio::io::split(transport);
        *self.writer.lock().await = Some(write_half);
        self.open.store(true, Ordering::Release);

        tokio::spawn(Arc::clone(self).receive_loop(read_half, shutdown_rx));

        // A disconnect may have landed while the transport was being
        // attached, before the shutdown channel existed; honor it now.
        let raced = self.state.lock().unwrap().local_disconnect;
        if raced {
            self.close_transport().await;
        }
        Ok(())
    }

    /// Send a datagram as one frame.
    ///
    /// Waits for the gather write to complete. On any transport error the
    /// datagram is treated as silently dropped and the error routes to the
    /// disconnect coordinator; connection loss is the only observable
    /// signal, there is no per-datagram result.
    pub async fn send(&self, datagram: Datagram) {
        if datagram.len() > MAX_PAYLOAD_LEN {
            warn!(
                len = datagram.len(),
                max = MAX_PAYLOAD_LEN,
                "dropping datagram larger than the length prefix can represent"
            );
            return;
        }

        let mut writer = self.writer.lock().await;
        let Some(write_half) = writer.as_mut() else {
            debug!("dropping datagram: connection is not open");
            return;
        };

        if let Err(err) = write_frame(write_half, &datagram).await {
            drop(writer);
            self.handle_disconnect(FramelinkError::Io(err)).await;
        }
    }

    /// Disconnect locally with no explicit cause.
    ///
    /// The handler's `receive_disconnect` will fire with `None`.
    pub async fn disconnect(&self) {
        self.disconnect_with_cause(None).await;
    }

    /// Disconnect locally, recording `cause` as the reason.
    ///
    /// Closes the transport; the disconnect notification itself is driven
    /// through the in-flight read and reports the recorded cause, not the
    /// channel-closed error the shutdown produces. On a connection that was
    /// never initialized there is no transport to close, so the lifecycle
    /// settles immediately: the handler is notified with `cause` and a
    /// later `initialize` is rejected.
    pub async fn disconnect_with_cause(&self, mut cause: Option<FramelinkError>) {
        let notify_directly = {
            let mut state = self.state.lock().unwrap();
            match state.phase {
                Phase::Disconnected => return,
                Phase::Idle => {
                    state.phase = Phase::Disconnected;
                    state.local_disconnect = true;
                    true
                }
                Phase::Connected => {
                    state.local_disconnect = true;
                    state.cause = cause.take();
                    false
                }
            }
        };

        if notify_directly {
            debug!(?cause, local = true, "connection disconnected");
            self.handler.receive_disconnect(cause);
        } else {
            self.close_transport().await;
        }
    }

    /// Wake the receive loop and shut the write half down. Idempotent and
    /// safe to race from `disconnect` and the `initialize` re-check.
    async fn close_transport(&self) {
        let shutdown = self.state.lock().unwrap().shutdown.take();
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }

        if self.open.swap(false, Ordering::AcqRel) {
            let mut writer = self.writer.lock().await;
            if let Some(write_half) = writer.as_mut() {
                let _ = write_half.shutdown().await;
            }
        }
    }

    /// Whether the transport is currently open.
    ///
    /// A snapshot, not a guarantee that a subsequent operation succeeds.
    pub fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Remote endpoint, cached at initialization. `None` before then.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.state.lock().unwrap().remote
    }

    /// Local endpoint, cached at initialization. `None` before then.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().unwrap().local
    }

    /// Receive loop: one read in flight at a time, each complete datagram
    /// delivered to the handler before the next read is armed. The loop is
    /// abandoned, not transitioned, on disconnect.
    async fn receive_loop(
        self: Arc<Self>,
        mut read_half: ReadHalf<Transport>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut frames = FrameReader::new();
        loop {
            let datagram = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    // Local disconnect; the recorded cause replaces this one.
                    self.handle_disconnect(FramelinkError::ConnectionClosed).await;
                    return;
                }
                next = frames.next(&mut read_half) => match next {
                    Ok(datagram) => datagram,
                    Err(err) => {
                        self.handle_disconnect(err).await;
                        return;
                    }
                },
            };

            self.handler.receive_datagram(datagram);
        }
    }

    /// Single funnel for every disconnect path.
    ///
    /// Guarded by the `Connected -> Disconnected` transition: the first
    /// caller closes the transport and notifies the handler, later callers
    /// return immediately. The state lock is released before the handler
    /// callback so the handler may call back into the connection.
    async fn handle_disconnect(&self, cause: FramelinkError) {
        let (local_disconnect, recorded) = {
            let mut state = self.state.lock().unwrap();
            if state.phase == Phase::Disconnected {
                return;
            }
            state.phase = Phase::Disconnected;
            state.shutdown = None;
            (state.local_disconnect, state.cause.take())
        };

        self.open.store(false, Ordering::Release);
        {
            let mut writer = self.writer.lock().await;
            if let Some(write_half) = writer.as_mut() {
                let _ = write_half.shutdown().await;
            }
            *writer = None;
        }

        let cause = if local_disconnect {
            recorded
        } else {
            Some(cause)
        };
        debug!(?cause, local = local_disconnect, "connection disconnected");
        self.handler.receive_disconnect(cause);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The creator must not tear the connection down while its transport
        // is open; the receive task's Arc keeps us alive until the
        // disconnect notification has fired.
        debug_assert!(
            !self.is_connected(),
            "connection dropped while transport still open"
        );
    }
}
