//! Mentorbridge - Permission-Gated Client Data Engine
//!
//! Binary entry point: loads configuration, opens the database, and runs
//! the HTTP API server.

use clap::{Parser, Subcommand};
use mentorbridge_core::api::server::{ApiServer, ApiServerConfig};
use mentorbridge_core::{Engine, Settings, SqliteStorage};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mentorbridge", version, about = "Permission-gated client data engine")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, overrides config
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Database URL, overrides config
        #[arg(long, env = "MENTORBRIDGE_DATABASE_URL")]
        database: Option<String>,
    },

    /// Create the database schema and exit
    InitDb {
        /// Database URL, overrides config
        #[arg(long, env = "MENTORBRIDGE_DATABASE_URL")]
        database: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mentorbridge=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { listen, database } => {
            if let Some(listen) = listen {
                settings.listen = listen;
            }
            if let Some(database) = database {
                settings.database_url = database;
            }

            let storage = SqliteStorage::new(&settings.database_url).await?;
            storage.run_migrations().await?;

            let engine = Arc::new(Engine::new(Arc::new(storage), settings.sharing.clone()));
            let server = ApiServer::new(
                ApiServerConfig {
                    addr: settings.listen,
                },
                engine,
            );
            server.serve().await?;
        }
        Command::InitDb { database } => {
            if let Some(database) = database {
                settings.database_url = database;
            }

            let storage = SqliteStorage::new(&settings.database_url).await?;
            storage.run_migrations().await?;
            info!("Schema ready at {}", settings.database_url);
        }
    }

    Ok(())
}
