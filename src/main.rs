use clap::{Args, Parser, Subcommand};
use massgeo::geocode::{
    AddressQuery, AddressResolver, Diagnostic, ResolutionOutcome, ResolverConfig, WarningBand,
};
use std::path::PathBuf;
use std::sync::Arc;

/// massgeo: MassGIS address resolver
///
/// Geocodes a Massachusetts street address with the MassGIS Census TIGER
/// geocoder and reprojects the best match from EPSG:26986 to WGS84.
///
/// Examples:
///   massgeo resolve --street "1 Beacon St" --city Boston --zip 02108
///   massgeo resolve --street "10 Park Plaza" --city Boston --strict --debug
///   massgeo serve --port 8080
#[derive(Parser)]
#[command(name = "massgeo", version, about, long_about = None)]
struct Cli {
    /// Config file (JSON). Defaults to ~/.massgeo/config.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the geocoding endpoint URL.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Reject low-confidence matches instead of flagging them.
    #[arg(long, global = true)]
    strict: bool,

    /// Log level for massgeo (RUST_LOG overrides).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one address and print the outcome as JSON.
    Resolve(ResolveArgs),
    /// Serve the JSON API (GET /api/resolve?street=&city=&zip=).
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short = 'p', default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args)]
struct ResolveArgs {
    /// Street address, e.g. "1 Beacon St".
    #[arg(long)]
    street: String,

    #[arg(long, default_value = "")]
    city: String,

    #[arg(long, default_value = "")]
    zip: String,

    /// Print request URL, raw candidate and projected coordinates.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    massgeo::telemetry::init_tracing(&cli.log_level);

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let resolver = AddressResolver::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match cli.command {
        Command::Resolve(args) => run_resolve(resolver, args).await,
        Command::Serve { host, port } => {
            if let Err(e) = massgeo::server::start(&host, port, resolver).await {
                eprintln!("Error: server on {}:{} failed: {}", host, port, e);
                std::process::exit(1);
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<ResolverConfig, massgeo::geocode::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ResolverConfig::load_from(path)?,
        None => ResolverConfig::load()?,
    };
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if cli.strict {
        config.policy.warning_band = WarningBand::Reject;
    }
    Ok(config)
}

async fn run_resolve(resolver: AddressResolver, args: ResolveArgs) {
    let resolver = if args.debug {
        resolver.with_diagnostics(Arc::new(print_diagnostic))
    } else {
        resolver
    };

    let query = AddressQuery::new(args.street, args.city, args.zip);
    let outcome = resolver.resolve(&query).await;

    // ── Banner to stderr, JSON to stdout ────────────────────────
    let marker = if outcome.is_resolved() { "\u{1F4CD}" } else { "\u{26A0}\u{FE0F} " };
    eprintln!("  {} {}", marker, outcome.summary());

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot serialize outcome: {}", e);
            std::process::exit(1);
        }
    }

    if !matches!(outcome, ResolutionOutcome::Resolved { .. }) {
        std::process::exit(1);
    }
}

fn print_diagnostic(d: &Diagnostic) {
    match d {
        Diagnostic::Request { url } => eprintln!("  [debug] GET {}", url),
        Diagnostic::CandidateSelected { x, y, score } => {
            eprintln!("  [debug] x = {}, y = {}, score = {}", x, y, score)
        }
        Diagnostic::Projected { longitude, latitude } => {
            eprintln!("  [debug] projected lon = {}, lat = {}", longitude, latitude)
        }
        Diagnostic::RankingViolation { index, score, selected_score } => eprintln!(
            "  [debug] candidate {} scored {} above the selected {}",
            index, score, selected_score
        ),
        Diagnostic::UnexpectedSpatialReference { expected, reported } => eprintln!(
            "  [debug] service reported wkid {} (expected {})",
            reported, expected
        ),
    }
}
