//! CapBank HTTP server entry point

use std::path::PathBuf;
use std::time::Duration;

use capbank::{ServiceOptions, TimeoutPolicy, DEFAULT_TOP_K};
use capbank_server::{run, ServerConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "capbank-server")]
#[command(about = "HTTP API for capacitor network synthesis")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for HTTP server
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Catalog JSON file or directory (default: built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Maximum number of results per request
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Per-request deadline in milliseconds (0 disables it)
    #[arg(long, default_value_t = 5000)]
    deadline_ms: u64,

    /// What to do when the deadline expires: best-effort or fail
    #[arg(long, default_value = "best-effort")]
    on_timeout: TimeoutPolicy,

    /// Evaluation threads (default: number of CPUs)
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &args.log_level;
        EnvFilter::new(format!(
            "capbank={level},capbank_server={level},tower_http={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let defaults = ServiceOptions::default();
    let options = ServiceOptions {
        top_k: args.top_k,
        deadline: (args.deadline_ms > 0).then(|| Duration::from_millis(args.deadline_ms)),
        on_timeout: args.on_timeout,
        workers: args.workers.unwrap_or(defaults.workers),
        ..defaults
    };

    run(ServerConfig {
        host: args.host,
        port: args.port,
        catalog: args.catalog,
        options,
    })
    .await
}
