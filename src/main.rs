//! Vulnerability scanning demo service entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vuln_demo::api::{serve, AppState};
use vuln_demo::config::Config;
use vuln_demo::error::ErrorResponse;
use vuln_demo::metrics;
use vuln_demo::upstream::{FetchResponse, UpstreamClient, HTTP_CLIENT_VERSION};
use vuln_demo::utils::shutdown_signal;

/// Vulnerability scanning demo service.
#[derive(Parser, Debug)]
#[command(name = "vuln-demo")]
#[command(about = "Minimal JSON web service for dependency scanning demos")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Interface to bind (overrides HOST).
    #[arg(long, global = true)]
    host: Option<String>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,

    /// Perform the upstream fetch once and print the result.
    Fetch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so LOG_FORMAT and RUST_LOG apply
    let loaded = Config::load();

    // Initialize logging
    let (json_logs, level) = match &loaded {
        Ok(config) => (config.json_logs(), config.rust_log.clone()),
        Err(_) => (false, "info".to_string()),
    };
    init_logging(args.verbose, json_logs, &level);

    let mut config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Initialize metrics
    metrics::init_metrics();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Fetch) => cmd_fetch(&config).await,
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

fn init_logging(verbose: bool, json: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("vuln_demo=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Upstream URL: {}", config.upstream_url);
    info!("HTTP client version: {}", HTTP_CLIENT_VERSION);
    if config.upstream_insecure_tls {
        warn!("UPSTREAM_INSECURE_TLS is set; upstream certificates will not be verified");
    }

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::install_exporter(metrics_addr)?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }

    // One application object for the lifetime of the server
    let app_state = AppState::from_config(&config)?;

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    serve(listener, app_state, shutdown_signal()).await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("VULN DEMO - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Building upstream client... ");
    match UpstreamClient::new(&config.upstream()) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Upstream client construction failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}:{}", config.host, config.port);
    println!(
        "  Max Body Size: {}",
        match config.max_body_bytes {
            Some(bytes) => format!("{} bytes", bytes),
            None => "unlimited".to_string(),
        }
    );
    println!("  Upstream URL: {}", config.upstream_url);
    println!(
        "  Upstream Timeout: {}",
        match config.upstream_timeout_secs {
            Some(secs) => format!("{}s", secs),
            None => "none".to_string(),
        }
    );
    println!(
        "  Certificate Validation: {}",
        if config.upstream_insecure_tls {
            "DISABLED (insecure)"
        } else {
            "Enabled"
        }
    );
    println!(
        "  Metrics: {}",
        match config.metrics_addr() {
            Some(addr) => addr.to_string(),
            None => "Disabled".to_string(),
        }
    );
    println!("  Log Format: {}", config.log_format);
    println!("  HTTP Client Version: {}", HTTP_CLIENT_VERSION);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Perform the upstream fetch once and print what `/fetch-data` would return.
async fn cmd_fetch(config: &Config) -> anyhow::Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;

    let client = UpstreamClient::new(&config.upstream())?;
    info!("Fetching {}", client.url());

    match client.fetch().await {
        Ok(snapshot) => {
            let body = FetchResponse::from(snapshot);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            let body = ErrorResponse {
                error: e.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(e.into())
        }
    }
}
