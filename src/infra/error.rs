use std::net::SocketAddr;

use thiserror::Error;

/// Failures while bringing up or running process-level infrastructure.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("http server stopped: {0}")]
    Serve(#[source] std::io::Error),
    #[error("database unavailable")]
    Database(#[from] sqlx::Error),
    #[error("schema migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("{0} is required for this command")]
    MissingSetting(&'static str),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}
