//! `HooktapServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use hooktap_store::{BlobStore, Ledger};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::routes::{download, misc, requests, sample, webhook, ws};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::{BroadcastHub, SessionDeps};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bounded history of captured calls.
    pub ledger: Arc<Ledger>,
    /// Uploaded attachments.
    pub blobs: Arc<BlobStore>,
    /// Live viewer registry.
    pub hub: Arc<BroadcastHub>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus exposition handle.
    pub metrics: PrometheusHandle,
    /// Runtime configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Dependencies for a new viewer session.
    pub fn session_deps(&self) -> SessionDeps {
        SessionDeps {
            hub: Arc::clone(&self.hub),
            ledger: Arc::clone(&self.ledger),
            mailbox_capacity: self.config.mailbox_capacity,
            heartbeat_interval: self.config.heartbeat_interval,
            shutdown: self.shutdown.token(),
        }
    }
}

/// The hooktap server.
pub struct HooktapServer {
    config: Arc<ServerConfig>,
    ledger: Arc<Ledger>,
    blobs: Arc<BlobStore>,
    hub: Arc<BroadcastHub>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

/// A running server: its bound address and background tasks.
pub struct ServerHandle {
    /// Address the listener is bound to.
    pub addr: SocketAddr,
    server: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl ServerHandle {
    /// Background tasks, for [`ShutdownCoordinator::graceful_shutdown`].
    pub fn into_tasks(self) -> Vec<JoinHandle<()>> {
        vec![self.server, self.dispatcher]
    }
}

impl HooktapServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            ledger: Arc::new(Ledger::new()),
            blobs: Arc::new(BlobStore::new()),
            hub: Arc::new(BroadcastHub::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Shared handler state.
    pub fn state(&self) -> AppState {
        AppState {
            ledger: Arc::clone(&self.ledger),
            blobs: Arc::clone(&self.blobs),
            hub: Arc::clone(&self.hub),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            config: Arc::clone(&self.config),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(misc::root))
            .route("/test", get(misc::test))
            .route("/ping", get(misc::ping))
            .route("/ui", get(misc::ui))
            .route("/health", get(misc::health))
            .route("/metrics", get(misc::metrics))
            .route("/webhook", any(webhook::ingest))
            .route("/webhook/thoughtspot", any(sample::thoughtspot))
            .route("/api/requests", get(requests::list))
            .route("/download/", get(download::missing_filename))
            .route("/download/{*filename}", get(download::download))
            .route("/ws", get(ws::upgrade))
            .with_state(self.state())
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the listener, start the fan-out dispatcher, and serve until
    /// shutdown is signalled.
    pub async fn listen(&self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;

        let feed = self.ledger.subscribe();
        let dispatcher = tokio::spawn(Arc::clone(&self.hub).run(feed, self.shutdown.token()));

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let token = self.shutdown.token();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            if let Err(e) = result {
                error!(error = %e, "server stopped with error");
            }
        });

        info!(%addr, "hooktap listening");
        Ok(ServerHandle {
            addr,
            server,
            dispatcher,
        })
    }

    /// Get the request ledger.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Get the blob store.
    pub fn blobs(&self) -> &Arc<BlobStore> {
        &self.blobs
    }

    /// Get the broadcast hub.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
