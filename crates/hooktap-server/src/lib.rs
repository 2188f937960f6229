//! # hooktap-server
//!
//! Axum HTTP + `WebSocket` server for capturing and watching webhooks.
//!
//! - Ingest: any call to `/webhook` becomes a canonical record; multipart
//!   attachments land in the blob store
//! - History: `/api/requests` lists the bounded ledger newest-first
//! - Live feed: `/ws` replays history, then streams each new record
//! - Downloads: `/download/{filename}` serves stored attachments
//! - Operations: `/health`, Prometheus `/metrics`, graceful shutdown via
//!   `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod ingest;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::{ApiError, IngestError};
pub use server::{AppState, HooktapServer, ServerHandle};
pub use shutdown::ShutdownCoordinator;
