//! collection-api server and provisioning entry point.

use clap::{Parser, Subcommand};
use collection_api::{
    app, ensure_database_exists, load_from_dir, resolve, setup, teardown, AppState, DocumentStore, FullConfig,
    MemoryStore, PgStore, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "collection-api", version, about = "Document-collection CRUD API")]
struct Cli {
    /// Use the in-process store instead of PostgreSQL (data is lost on exit).
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create missing collections, then serve the API (default).
    Serve,
    /// Create missing collections.
    Setup,
    /// Drop all configured collections.
    Teardown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("collection_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let config = match &settings.config_path {
        Some(dir) => load_from_dir(dir).await?,
        None => FullConfig::builtin(),
    };
    let model = resolve(&config, &settings.collection_prefix)?;

    let store: Arc<dyn DocumentStore> = if cli.memory {
        tracing::warn!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        ensure_database_exists(&settings.database_url).await?;
        Arc::new(
            PgStore::connect(
                &settings.database_url,
                &settings.store_schema,
                settings.max_connections,
            )
            .await?,
        )
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Setup => {
            let created = setup(store.as_ref(), &model).await?;
            tracing::info!(created = created.len(), "setup complete");
        }
        Command::Teardown => {
            teardown(store.as_ref(), &model).await?;
            tracing::info!("teardown complete");
        }
        Command::Serve => {
            setup(store.as_ref(), &model).await?;
            let state = AppState {
                store,
                model: Arc::new(model),
            };
            let router = app(state, settings.max_body_bytes);
            let listener = TcpListener::bind(&settings.bind_addr).await?;
            tracing::info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, router).await?;
        }
    }
    Ok(())
}
