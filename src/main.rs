use std::{process, sync::Arc};

use postboard::{
    application::{error::AppError, posts::PostService},
    config::{self, Command, Settings, StorageBackend},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{ApiState, build_api_router},
        memory::MemoryPostsRepo,
        telemetry,
    },
};
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        report(&err);
        process::exit(1);
    }
}

/// Log through the installed subscriber, or a stderr one if startup failed first.
fn report(err: &AppError) {
    let chain = err.chain();
    if tracing::dispatcher::has_been_set() {
        error!(error = %chain, "postboard exited with an error");
        return;
    }
    let fallback = tracing_subscriber::fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(fallback, || {
        error!(error = %chain, "postboard exited with an error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli.command() {
        Command::Serve(_) => serve(settings).await,
        Command::Migrate(_) => migrate(settings).await,
    }
}

async fn open_store(settings: &Settings) -> Result<PostService, AppError> {
    let service = match settings.storage.backend {
        StorageBackend::Postgres => {
            let repos = Arc::new(PostgresRepositories::connect(&settings.database).await?);
            repos.migrate().await?;
            PostService::new(repos.clone(), repos)
        }
        StorageBackend::Memory => {
            warn!(
                target: "postboard::storage",
                "no database configured; posts live in memory and vanish on restart"
            );
            let store = Arc::new(MemoryPostsRepo::new());
            PostService::new(store.clone(), store)
        }
    };
    Ok(service)
}

async fn serve(settings: Settings) -> Result<(), AppError> {
    let service = open_store(&settings).await?;
    let addr = settings.server.addr;
    let router = build_api_router(ApiState::new(service), settings.api.body_limit());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| InfraError::Bind { addr, source })?;
    info!(
        target: "postboard::server",
        %addr,
        body_limit = settings.api.body_limit(),
        backend = ?settings.storage.backend,
        "listening"
    );

    axum::serve(listener, router)
        .await
        .map_err(InfraError::Serve)?;
    Ok(())
}

async fn migrate(settings: Settings) -> Result<(), AppError> {
    PostgresRepositories::connect(&settings.database)
        .await?
        .migrate()
        .await?;
    Ok(())
}
