mod jobs;
mod routes;
mod sweep;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rotacep_core::AppConfig;
use rotacep_geocode::{CepResolver, ResolverConfig, SourceError};

#[derive(Debug, Parser)]
#[command(name = "rotacep")]
#[command(about = "Delivery-radius distance estimation for Brazilian postal codes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every job in the jobs file, grouped by target city.
    Jobs,
    /// High-precision sweep of one postal root from an origin CEP.
    Sweep {
        /// Origin CEP (8 digits, separators allowed).
        #[arg(long)]
        origin: String,
        /// 5-digit postal root to sweep.
        #[arg(long)]
        root: String,
    },
    /// Fast centroid estimate of one postal root from an origin CEP.
    Quick {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        root: String,
    },
    /// Build (or refresh) the cached geocode map for one city.
    MapCity {
        #[arg(long)]
        state: String,
        #[arg(long)]
        city: String,
        /// Drop the cached entry first and resolve from scratch.
        #[arg(long)]
        refresh: bool,
    },
    /// Fill real-route distances into every queued detail sheet.
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = rotacep_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Jobs => jobs::run(&config).await,
        Commands::Sweep { origin, root } => sweep::run_sweep(&config, &origin, &root).await,
        Commands::Quick { origin, root } => sweep::run_quick(&config, &origin, &root).await,
        Commands::MapCity {
            state,
            city,
            refresh,
        } => jobs::run_map_city(&config, &state, &city, refresh).await,
        Commands::Routes => routes::run(&config).await,
    }
}

/// Builds the shared resolver from the runtime configuration.
pub(crate) fn build_resolver(config: &AppConfig) -> Result<CepResolver, SourceError> {
    CepResolver::new(ResolverConfig {
        scrape_base_url: config.scrape_base_url.clone(),
        api_timeout_secs: config.api_timeout_secs,
        scrape_timeout_secs: config.scrape_timeout_secs,
        geocode_timeout_secs: config.geocode_timeout_secs,
        geocode_min_interval_ms: config.geocode_min_interval_ms,
        user_agent: config.user_agent.clone(),
        ..ResolverConfig::default()
    })
}
