//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the player and the
//! broadcaster. It provides the router construction and server startup
//! functionality.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{StatusBroadcaster, SubscriberRegistry};
use crate::player::PlayerController;

pub mod command;
pub mod http;
pub mod response;
pub mod sse;

/// How often shutdown re-signals subscribers while waiting for the server
/// task to drain.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listening socket.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The server task panicked or was aborted.
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to the player and the
/// broadcaster. All player logic lives behind [`PlayerController`].
#[derive(Clone)]
pub struct AppState {
    /// Player engine the endpoints act on.
    pub player: Arc<dyn PlayerController>,
    /// Publishes status snapshots to event-stream subscribers.
    pub broadcaster: StatusBroadcaster,
}

impl AppState {
    /// Creates the state from a player and the broadcaster it reports to.
    pub fn new(player: Arc<dyn PlayerController>, broadcaster: StatusBroadcaster) -> Self {
        Self {
            player,
            broadcaster,
        }
    }

    /// Returns the registry of event-stream subscribers.
    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        self.broadcaster.registry()
    }
}

/// Handle to a running server.
///
/// Dropping the handle leaves the server running; call
/// [`ServerHandle::shutdown`] to stop it.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    subscribers: Arc<SubscriberRegistry>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections, ends every event stream and waits for
    /// the server task to finish.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        log::info!("[Server] Shutting down {}", self.local_addr);
        self.shutdown.cancel();

        // Connections accepted just before the cancel may still register a
        // subscriber, so keep signaling until the server has drained.
        let mut task = self.task;
        loop {
            self.subscribers.close_all();
            if let Ok(result) = tokio::time::timeout(SHUTDOWN_POLL_INTERVAL, &mut task).await {
                return result?;
            }
        }
    }
}

/// Binds `addr` and serves the API on a background task.
///
/// Returns once the socket is bound, so the caller never blocks on the
/// accept loop. A bind failure is returned, never panicked on.
pub async fn spawn_server(state: AppState, addr: SocketAddr) -> Result<ServerHandle, ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_listener(state, listener)
}

/// Serves the API on an already bound listener, on a background task.
pub fn serve_listener(state: AppState, listener: TcpListener) -> Result<ServerHandle, ServerError> {
    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    let shutdown = CancellationToken::new();
    let subscribers = Arc::clone(state.subscribers());
    let app = http::create_router(state);

    let token = shutdown.clone();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(ServerError::Serve)
    });

    log::info!("[Server] Listening on http://{}", local_addr);

    Ok(ServerHandle {
        local_addr,
        shutdown,
        subscribers,
        task,
    })
}
