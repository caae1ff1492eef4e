//! TCP server for pushing booking events to clients
//!
//! Clients connect, identify themselves with a Hello frame, and then
//! receive event frames as the engines emit them. The inbound direction
//! only carries keepalive pings.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::Message;
use crate::registry::ConnectionRegistry;

/// Outbound queue depth per connection
const CHANNEL_CAPACITY: usize = 64;

/// Notification server handle
pub struct NotifyServer {
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    shutdown_tx: broadcast::Sender<()>,
}

impl NotifyServer {
    /// Start the server on the given port
    pub async fn start(port: u16, registry: Arc<ConnectionRegistry>) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Notification server started");

        let (shutdown_tx, _) = broadcast::channel(1);

        let registry_clone = registry.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(accept_connections(listener, registry_clone, shutdown_rx));

        Ok(NotifyServer {
            addr: bound_addr,
            registry,
            shutdown_tx,
        })
    }

    /// The address the server actually bound (port 0 resolves here)
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The registry this server registers connections into
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Signal the accept loop to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Notification server shutdown initiated");
    }
}

/// Accept clients until shutdown; each gets its own task
async fn accept_connections(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "Incoming connection");
                        let registry = registry.clone();
                        tokio::spawn(handle_connection(stream, addr, registry));
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Drive one client: handshake, register, then pump frames both ways
async fn handle_connection(stream: TcpStream, addr: SocketAddr, registry: Arc<ConnectionRegistry>) {
    let (mut reader, mut writer) = tokio::io::split(stream);

    // First frame must be Hello
    let user_id = match handle_hello(&mut reader).await {
        Ok(id) => id,
        Err(e) => {
            warn!(addr = %addr, error = %e, "Handshake failed");
            let rejected = Message::Rejected {
                reason: e.to_string(),
            };
            let _ = write_frame(&mut writer, &rejected).await;
            return;
        }
    };

    let (msg_tx, msg_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // Last connection wins; a previous entry for this user is replaced
    registry.register(user_id, msg_tx.clone());

    let writer_handle = tokio::spawn(drain_outbound(writer, msg_rx));

    let _ = msg_tx.send(Message::Welcome).await;

    info!(addr = %addr, user_id = %user_id, "Client connected");

    // Read loop: clients only send keepalives
    loop {
        match read_frame(&mut reader).await {
            Ok(Message::Ping) => {
                let _ = msg_tx.send(Message::Pong).await;
            }
            Ok(_) => {
                debug!(user_id = %user_id, "Ignoring unexpected message type");
            }
            Err(Error::ConnectionClosed) => {
                debug!(user_id = %user_id, "Connection closed");
                break;
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Read error");
                break;
            }
        }
    }

    // Cleanup; a newer connection for this user stays registered
    writer_handle.abort();
    registry.unregister(user_id, &msg_tx);

    info!(user_id = %user_id, "Client disconnected");
}

/// First frame must identify the user
async fn handle_hello(reader: &mut ReadHalf<TcpStream>) -> Result<Uuid> {
    match read_frame(reader).await? {
        Message::Hello { user_id } => Ok(user_id),
        _ => Err(Error::Protocol("Expected Hello".into())),
    }
}

/// Drain a connection's outbound queue onto its socket
async fn drain_outbound(mut writer: WriteHalf<TcpStream>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &msg).await {
            debug!(error = %e, "Write failed, stopping writer");
            break;
        }
    }
}
