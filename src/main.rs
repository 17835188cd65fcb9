use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use waypoint_resolver::config::ResolverConfig;
use waypoint_resolver::destination::types::{QueryContext, Result};
use waypoint_resolver::destination::DestinationResolver;
use waypoint_resolver::{logging, server};

/// Waypoint: resolve free-form travel destinations to IATA codes.
///
/// Examples:
///   waypoint JFK
///   waypoint "french riviera"
///   waypoint "somewhere near the beach in France" --country US
///   waypoint --suggest san --limit 5
///   waypoint --serve --port 3000
#[derive(Parser)]
#[command(name = "waypoint", version, about, long_about = None)]
struct Cli {
    /// Destination text to resolve. Example: waypoint "Cote d'Azur"
    #[arg(index = 1)]
    query: Option<String>,

    /// Departure country (ISO 3166-1 alpha-2, e.g. US, FR).
    #[arg(long)]
    country: Option<String>,

    /// Bias latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Bias longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Print autocomplete suggestions for a prefix instead of resolving.
    #[arg(long, conflicts_with = "query")]
    suggest: Option<String>,

    /// Maximum number of suggestions.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Run the HTTP API server.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Offline mode: disable geocoding and LLM layers.
    #[arg(long)]
    offline: bool,

    /// Debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.serve {
        logging::init_server_logger();
    } else {
        logging::init_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ResolverConfig::load(cli.config.as_deref())?;
    if cli.offline {
        config = config.offline();
    }
    let resolver = Arc::new(DestinationResolver::from_config(&config)?);

    if cli.serve {
        return server::start(&cli.host, cli.port, resolver).await;
    }

    if let Some(prefix) = &cli.suggest {
        let suggestions = resolver.suggest(prefix, cli.limit);
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    let Some(query) = cli.query.as_deref() else {
        eprintln!("Error: provide a destination, --suggest PREFIX or --serve. See --help.");
        std::process::exit(2);
    };

    let context = QueryContext {
        departure_country: cli.country.clone(),
        bias_lat: cli.lat,
        bias_lon: cli.lon,
    };
    let result = resolver.resolve(query, context).await;

    if let Some(primary) = &result.primary {
        eprintln!(
            "  {} -> {} ({:.2}, layer {}){}",
            query,
            primary.destination_code,
            primary.confidence,
            primary.source_layer.number(),
            if result.needs_confirmation() { ", confirm with user" } else { "" },
        );
    } else if result.degraded {
        eprintln!("  {} -> no match before the deadline", query);
    } else {
        eprintln!("  {} -> no match", query);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
