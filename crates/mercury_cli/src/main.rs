use clap::Parser;
use mercury_core::{ArticleStorage, DiscoveryConfig, Result};
use mercury_discovery::logging::init_logging;
use mercury_discovery::{handle_command, DiscoveryCommands, DiscoveryEngine, HttpFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Discover Illawarra Mercury stories", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "memory", global = true)]
    storage: String,
    /// Database file for the sqlite backend
    #[arg(long, global = true)]
    database: Option<String>,
    /// TOML file overriding the built-in discovery settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    /// Maximum concurrent HTTP fetches
    #[arg(long, global = true)]
    pool_capacity: Option<usize>,
    #[command(subcommand)]
    command: DiscoveryCommands,
}

fn load_config(cli: &Cli) -> Result<DiscoveryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("📄 Loading configuration from {}", path.display());
            DiscoveryConfig::from_toml_file(path)?
        }
        None => DiscoveryConfig::default(),
    };
    if let Some(capacity) = cli.pool_capacity {
        config.pool_capacity = capacity;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config(&cli)?;

    let storage: Arc<dyn ArticleStorage> =
        mercury_storage::create_storage(cli.storage.as_str(), cli.database.as_deref()).await?;
    info!("💾 Storage initialized (using {})", cli.storage);

    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let mut engine = DiscoveryEngine::new(storage, fetcher, config)?;
    info!(pool_capacity = engine.pool().capacity(), "🦗 Discovery engine ready");

    let output = handle_command(cli.command, &mut engine).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
