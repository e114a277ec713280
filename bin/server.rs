// VivaaTown - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vivaa_town::api::{router, AppState};
use vivaa_town::logging::{init_logging, DEFAULT_LOG_FILTER};
use vivaa_town::{migrate_legacy, ServerArgs, Storage};

#[derive(Debug, Parser)]
#[command(name = "vivaa-server", version, about = "VivaaTown HTTP API")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(DEFAULT_LOG_FILTER)?;
    let cli = Cli::parse();
    let args = cli.server;

    let config = args.storage.economy()?;
    let storage = Storage::open(&args.storage.db_path)
        .with_context(|| format!("failed to open {}", args.storage.db_path.display()))?;

    let migration = migrate_legacy(&storage).context("legacy migration failed")?;
    if !migration.already_migrated {
        info!(?migration, "legacy data checked");
    }

    let app = router(AppState::new(storage, config));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "server listening");

    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
