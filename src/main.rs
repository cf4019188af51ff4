use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xtream_relay::{
    config::Config,
    database::{
        Database,
        repositories::{CatalogRepository, ConnectionRepository, UserRepository},
    },
    proxy::ProxyService,
    sync::{SyncEngine, SyncService},
    upstream::XtreamClient,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "xtream-relay")]
#[command(version = "0.1.0")]
#[command(about = "IPTV catalog relay and HLS stream proxy for Xtream Codes providers")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("xtream_relay={},tower_http=trace", cli.log_level)
    } else {
        format!("xtream_relay={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Starting xtream-relay v{}", env!("CARGO_PKG_VERSION"));

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database ready ({})", database.backend_name());

    let db = database.connection();
    let connections = ConnectionRepository::new(db.clone());
    let catalog = CatalogRepository::new(db.clone());
    let users = UserRepository::new(db);

    let upstream = Arc::new(XtreamClient::new(&config.upstream)?);
    let proxy = Arc::new(ProxyService::new(&config.proxy)?);

    let engine = SyncEngine::new(catalog.clone(), connections.clone(), upstream.clone());
    let sync = Arc::new(SyncService::start(
        engine,
        config.sync.workers,
        config.sync.queue_depth,
    ));

    let state = AppState {
        config: Arc::new(config),
        db: database.connection(),
        connections,
        catalog,
        users,
        upstream,
        sync,
        proxy,
    };

    WebServer::new(state).serve().await
}
