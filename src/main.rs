use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkin_desk::{ClientRegistry, ClientRepository, Config, MemoryClientRepository, api, db};

#[derive(Parser, Debug)]
#[command(name = "checkin_desk", about = "Check-in desk client registry")]
struct Cli {
    /// Keep clients in memory instead of Postgres (data is lost on exit)
    #[arg(long)]
    in_memory: bool,

    /// Address to bind, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin_desk=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let repo: Arc<dyn ClientRepository> = if cli.in_memory {
        tracing::warn!("Using in-memory client store, data will not persist");
        Arc::new(MemoryClientRepository::new())
    } else {
        tracing::info!("Connecting to database");
        let database = db::init(&config).await?;
        tracing::info!("Database connected and migrated");
        Arc::new(database)
    };

    api::run(&config, ClientRegistry::new(repo)).await
}
