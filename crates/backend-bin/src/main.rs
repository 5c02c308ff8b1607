// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Entry point for the Study Companion API server.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use companion_backend_lib::{
    config::{Settings, DEFAULT_CONFIG_FILE},
    router::create_router,
    storage::{CredentialStore, DatabasePool, SqliteStorage},
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often expired login lockouts are swept
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Study Companion chat API.
#[derive(Parser)]
#[command(name = "companion-server", version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "COMPANION_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default).
    Serve,

    /// Delete a user along with all of their chats and messages.
    DeleteUser {
        /// Username of the account to remove.
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)?;

    init_tracing(&settings);

    let pool = DatabasePool::from_settings(&settings.storage)
        .await
        .with_context(|| format!("failed to open database {}", settings.storage.database_url))?;
    let storage = SqliteStorage::new(pool);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(storage.clone(), &settings).await?,
        Commands::DeleteUser { username } => delete_user(&storage, &username).await?,
    }

    storage.pool().close().await;
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let json = settings.logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn serve(storage: SqliteStorage, settings: &Settings) -> Result<()> {
    let state = Arc::new(AppState::new(storage, settings)?);

    let limiter = state.auth_rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn delete_user(storage: &SqliteStorage, username: &str) -> Result<()> {
    let user = storage
        .find_by_username(username)
        .await?
        .with_context(|| format!("no user named {username:?}"))?;

    storage.delete_user(user.id).await?;
    tracing::info!(user_id = %user.id, %username, "user deleted");
    println!("Deleted user {username} (id {})", user.id);
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
