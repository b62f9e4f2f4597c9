//! Catalog auth API server binary.

use std::sync::Arc;

use catalog_api::AppState;
use catalog_api::config::ApiConfig;
use catalog_core::store::UserStore;
use catalog_core::store::memory::MemoryStore;
use catalog_core::store::postgres::PgStore;
use clap::{Parser, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Storage backend for users, roles and refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// PostgreSQL via `--database-url`.
    Postgres,
    /// Process-local maps. Everything is lost on exit.
    Memory,
}

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "catalog_api_server", about = "Catalog auth API server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Storage backend.
    #[arg(long, env = "CATALOG_STORE", value_enum, default_value_t = StoreKind::Postgres)]
    store: StoreKind,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,catalog_api=debug,catalog_core=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }
    info!(
        version = catalog_core::version(),
        bind = %config.bind_addr,
        store = ?args.store,
        auth = ?config.auth,
        "starting catalog_api_server"
    );

    let state = match args.store {
        StoreKind::Postgres => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(&config.pg_connection_url)
                .await?;

            info!("running database migrations");
            catalog_api::migrate(&pool).await?;

            let store = Arc::new(PgStore::new(pool));
            store.seed_roles().await?;
            AppState::new(store, &config.auth)?
        }
        StoreKind::Memory => {
            warn!("using in-memory store; accounts and tokens are lost on exit");
            AppState::new(Arc::new(MemoryStore::new()), &config.auth)?
        }
    };

    let app = catalog_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
