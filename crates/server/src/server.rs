//! Accept-loop server.
//!
//! Binds a TCP port, spawns one handler task per accepted connection, and
//! stops cooperatively between accept iterations.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::handler;
use crate::result_log::ResultLog;
use crate::store::FileStore;

/// Server construction parameters.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory where uploaded files are stored.
    pub save_dir: PathBuf,
    /// Path of the shared result log.
    pub result_log_path: PathBuf,
}

/// The upload server.
///
/// Owns the listening socket and dispatches one concurrent handler per
/// connection. Handlers share only the result log.
pub struct FileServer {
    config: ServerConfig,
    store: Arc<FileStore>,
    result_log: Arc<ResultLog>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl FileServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let store = Arc::new(FileStore::new(&config.save_dir));
        let result_log = Arc::new(ResultLog::new(&config.result_log_path));
        Arc::new(Self {
            config,
            store,
            result_log,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Requests a cooperative stop.
    ///
    /// The accept loop exits between iterations; in-flight handlers run to
    /// completion and are not joined.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until shutdown.
    ///
    /// A bind failure is fatal and propagates; accept errors are logged
    /// and the loop continues.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        // The save directory must exist before the first connection.
        self.store.ensure_dir().await?;

        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            %local_addr,
            save_dir = %self.store.save_dir().display(),
            "upload server listening"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            tracing::debug!(%peer_addr, "connection accepted");
                            let store = Arc::clone(&self.store);
                            let result_log = Arc::clone(&self.result_log);
                            tokio::spawn(handler::handle(stream, peer_addr, store, result_log));
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }
}
