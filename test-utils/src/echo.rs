//! Loopback TCP echo server for network tests.
//!
//! [`EchoServer`] binds a local port and writes every byte it receives back
//! to the sender. Paired with [`reachable`] and the poller it gives tests a
//! peer that is known to answer, without fixed startup sleeps.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::EchoError;
use crate::probe::{Probe, Reply};

/// TCP server that echoes everything back on each connection.
///
/// # Example
///
/// ```no_run
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
/// use tokio::net::TcpStream;
/// use test_utils::EchoServer;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let server = EchoServer::start().await?;
///
/// let mut stream = TcpStream::connect(server.local_addr()).await?;
/// stream.write_all(b"ping").await?;
///
/// let mut buf = [0u8; 4];
/// stream.read_exact(&mut buf).await?;
/// assert_eq!(&buf, b"ping");
///
/// server.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct EchoServer {
    /// Address the listener is bound to
    local_addr: SocketAddr,
    /// Connections accepted so far
    connections: Arc<AtomicUsize>,
    /// Shutdown signal sender; dropping it also stops the accept loop
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Accept loop task handle
    server_handle: Option<JoinHandle<()>>,
}

impl EchoServer {
    /// Start an echo server on an ephemeral loopback port
    pub async fn start() -> Result<Self, EchoError> {
        Self::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await
    }

    /// Start an echo server on the given address
    pub async fn bind<A>(addr: A) -> Result<Self, EchoError>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let server_handle = tokio::spawn(Self::accept_loop(
            listener,
            Arc::clone(&connections),
            shutdown_rx,
        ));

        info!(%local_addr, "Echo server listening");

        Ok(Self {
            local_addr,
            connections,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Stop accepting connections and wait for the accept loop to end.
    ///
    /// Connections that are already open keep echoing until their peer
    /// closes them.
    pub async fn shutdown(mut self) -> Result<(), EchoError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| EchoError::Shutdown(format!("Accept loop failed: {e}")))?;
        }

        info!(local_addr = %self.local_addr, "Echo server stopped");
        Ok(())
    }

    async fn accept_loop(
        listener: TcpListener,
        connections: Arc<AtomicUsize>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                // Fires on an explicit shutdown and when the server is dropped
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.fetch_add(1, Ordering::SeqCst);
                        debug!(%peer, "Echo connection accepted");
                        tokio::spawn(Self::echo(stream, peer));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept echo connection");
                    }
                },
            }
        }
    }

    async fn echo(mut stream: TcpStream, peer: SocketAddr) {
        let (mut reader, mut writer) = stream.split();

        match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(bytes) => debug!(%peer, bytes, "Echo connection closed"),
            Err(e) => debug!(%peer, error = %e, "Echo connection ended with error"),
        }
    }
}

impl std::fmt::Debug for EchoServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoServer")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.connections())
            .finish()
    }
}

/// Probe that succeeds once a TCP connection to `addr` can be opened.
///
/// Each check connects from a spawned task, so this probe needs a tokio
/// runtime and is meant for [`poll`](crate::poll()) and
/// [`poll_until`](crate::poll_until()). Connection errors are reported as
/// non-success and retried.
///
/// # Panics
///
/// Each check panics when run outside a tokio runtime, e.g. when handed to
/// [`poll_blocking`](crate::poll_blocking()) from a plain `#[test]`.
pub fn reachable(addr: SocketAddr) -> impl Probe {
    move |reply: Reply| {
        tokio::spawn(async move {
            match TcpStream::connect(addr).await {
                Ok(_) => reply.success(),
                Err(e) => reply.failed(e),
            }
        });
    }
}
