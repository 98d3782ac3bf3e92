//! CapBank CLI - capacitor network synthesis from the command line.

use capbank::catalog::load_catalog;
use capbank::{
    CapBankError, CatalogStore, ConnectionType, OptimizationService, OptimizeRequest, ResultSet,
    ServiceOptions, TimeoutPolicy, DEFAULT_TOP_K,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capbank")]
#[command(about = "Capacitor network synthesis from real catalog parts", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level written to stderr (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the packages available in the catalog
    Packages {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List catalog parts
    Catalog {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Only show parts in these packages
        #[arg(short = 'p', long = "package", value_name = "PACKAGE")]
        packages: Vec<String>,

        /// Show ESR and dimensions
        #[arg(short, long)]
        verbose: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Find networks for a target capacitance
    Optimize {
        /// Target capacitance in farads, or with a suffix (100n, 4.7u, 10uF)
        #[arg(long, value_parser = parse_capacitance)]
        target: f64,

        /// Allowed deviation as a fraction of the target
        #[arg(long, default_value_t = 0.1)]
        tolerance: f64,

        /// DC-bias capacitance loss as a fraction
        #[arg(long, default_value_t = 0.0)]
        dc_bias: f64,

        /// Maximum number of parts in a network
        #[arg(long, default_value_t = 4)]
        max_count: i64,

        /// Minimum voltage rating of the network in volts
        #[arg(long, default_value_t = 0.0)]
        min_volt: f64,

        /// Minimum temperature rating of every part in °C
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        min_temp: f64,

        /// Allowed wiring: any, series, parallel, series-of-parallel, parallel-of-series
        #[arg(long, default_value = "any")]
        conn: ConnectionType,

        /// Allowed packages (default: every package in the catalog)
        #[arg(short = 'p', long = "package", value_name = "PACKAGE")]
        packages: Vec<String>,

        /// Maximum network ESR in ohms
        #[arg(long)]
        max_esr: Option<f64>,

        #[command(flatten)]
        catalog: CatalogArgs,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Run a raw /optimize request body from a JSON file ("-" for stdin)
    Run {
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog JSON file or directory (default: built-in catalog)
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    /// Maximum number of results
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Search deadline in milliseconds (0 disables it)
    #[arg(long, default_value_t = 5000)]
    deadline_ms: u64,

    /// What to do when the deadline expires: best-effort or fail
    #[arg(long, default_value = "best-effort")]
    on_timeout: TimeoutPolicy,

    /// Evaluation threads (default: number of CPUs)
    #[arg(long)]
    workers: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Exit with error code if no network satisfies the request
    #[arg(long)]
    fail_if_empty: bool,
}

impl SearchArgs {
    fn options(&self) -> ServiceOptions {
        let defaults = ServiceOptions::default();
        ServiceOptions {
            top_k: self.top_k,
            deadline: (self.deadline_ms > 0).then(|| Duration::from_millis(self.deadline_ms)),
            on_timeout: self.on_timeout,
            workers: self.workers.unwrap_or(defaults.workers),
            ..defaults
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output, same shape as the HTTP API
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let exit_code = match cli.command {
        Commands::Packages { catalog, format } => handle_packages(&catalog, format),
        Commands::Catalog {
            catalog,
            packages,
            verbose,
            format,
        } => handle_catalog(&catalog, &packages, verbose, format),
        Commands::Optimize {
            target,
            tolerance,
            dc_bias,
            max_count,
            min_volt,
            min_temp,
            conn,
            packages,
            max_esr,
            catalog,
            search,
        } => {
            let store = match load_store(&catalog) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            let packages = if packages.is_empty() {
                store.packages().to_vec()
            } else {
                packages
            };
            let request = OptimizeRequest {
                target_cap: target,
                tolerance,
                dc_bias,
                max_count,
                min_rated_volt: min_volt,
                min_temp,
                conn_type: conn.code(),
                packages,
                max_esr,
            };
            handle_optimize(store, &request, &search)
        }
        Commands::Run {
            request,
            catalog,
            search,
        } => {
            let request = match read_request(&request) {
                Ok(request) => request,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            match load_store(&catalog) {
                Ok(store) => handle_optimize(store, &request, &search),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    };

    process::exit(exit_code);
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("capbank={level},capbank_cli={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_store(args: &CatalogArgs) -> Result<Arc<CatalogStore>, CapBankError> {
    match &args.catalog {
        Some(path) => tracing::debug!("Loading catalog from {}", path.display()),
        None => tracing::debug!("Using built-in catalog"),
    }
    let parts = load_catalog(args.catalog.as_deref())?;
    Ok(Arc::new(CatalogStore::new(parts)?))
}

fn read_request(path: &Path) -> Result<OptimizeRequest, CapBankError> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn handle_packages(args: &CatalogArgs, format: OutputFormat) -> i32 {
    let store = match load_store(args) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match format {
        OutputFormat::Human => {
            for package in store.packages() {
                println!("{}", package);
            }
            0
        }
        OutputFormat::Json => print_json(serde_json::to_value(store.packages())),
    }
}

fn handle_catalog(args: &CatalogArgs, packages: &[String], verbose: bool, format: OutputFormat) -> i32 {
    let store = match load_store(args) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let allowed = if packages.is_empty() {
        store.packages().iter().cloned().collect()
    } else {
        store.intersect_packages(packages)
    };
    let mut parts: Vec<_> = store.parts(&allowed).collect();
    parts.sort_by(|a, b| {
        a.capacitance
            .total_cmp(&b.capacitance)
            .then_with(|| a.id.cmp(&b.id))
    });

    if let OutputFormat::Json = format {
        return print_json(serde_json::to_value(&parts));
    }

    println!("{} parts\n", parts.len());
    for part in parts {
        println!(
            "  {:<22} {:>10}  {:>5.1} V  {:>4.0}°C  {:<5} {:>7.3} mm³",
            part.id,
            format_capacitance(part.capacitance),
            part.rated_voltage,
            part.rated_temp,
            part.package,
            part.volume_mm3
        );
        if verbose {
            let esr = part
                .esr_ohm
                .map(|r| format!("{} Ω", r))
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "    ESR: {}  Size: {:.2} x {:.2} x {:.2} mm",
                esr,
                part.length_mm.unwrap_or(0.0),
                part.width_mm.unwrap_or(0.0),
                part.height_mm()
            );
        }
    }
    0
}

fn handle_optimize(store: Arc<CatalogStore>, request: &OptimizeRequest, search: &SearchArgs) -> i32 {
    let service = match OptimizationService::new(store, search.options()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match service.optimize(request) {
        Ok(result) => {
            let code = match search.format {
                OutputFormat::Human => {
                    output_human(request, &result);
                    0
                }
                OutputFormat::Json => print_json(serde_json::to_value(&result.candidates)),
            };
            if code == 0 && search.fail_if_empty && result.is_empty() {
                return 1;
            }
            code
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn output_human(request: &OptimizeRequest, result: &ResultSet) {
    println!(
        "\nTarget: {} ±{:.1}%  ({} networks evaluated in {:.1?})",
        format_capacitance(request.target_cap),
        request.tolerance * 100.0,
        result.stats.evaluated,
        result.stats.elapsed
    );
    println!("{}", "─".repeat(60));

    if result.stats.timed_out {
        println!("  Deadline reached, results are partial");
    }
    if result.is_empty() {
        println!("  No feasible network found");
        return;
    }

    for (rank, c) in result.candidates.iter().enumerate() {
        println!(
            "\n  {:>2}. [{}] {}",
            rank + 1,
            c.shape_tag,
            c.label
        );
        println!(
            "      {}  {:.3} mm³  {:.1} V  {:.0}°C",
            format_capacitance(c.capacitance),
            c.volume_mm3,
            c.voltage_rating,
            c.temp_rating
        );
        match c.esr_ohm {
            Some(esr) => println!("      BOM: {}  ESR: {:.4} Ω", c.bom, esr),
            None => println!("      BOM: {}", c.bom),
        }
    }
    println!("\n  {} results", result.len());
}

fn print_json(value: Result<serde_json::Value, serde_json::Error>) -> i32 {
    match value.and_then(|v| serde_json::to_string_pretty(&v)) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Parse a capacitance given in farads or with an SI suffix.
fn parse_capacitance(value: &str) -> Result<f64, String> {
    let value = value.trim();
    if let Ok(farads) = value.parse::<f64>() {
        return Ok(farads);
    }

    let lower = value.to_lowercase();
    let split = lower
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| format!("invalid capacitance '{}'", value))?;
    let (number, unit) = lower.split_at(split);
    let number: f64 = number
        .parse()
        .map_err(|_| format!("invalid capacitance '{}'", value))?;

    let multiplier = match unit.trim() {
        "pf" | "p" => 1e-12,
        "nf" | "n" => 1e-9,
        "uf" | "u" | "µf" | "µ" => 1e-6,
        "mf" | "m" => 1e-3,
        "f" => 1.0,
        other => return Err(format!("unknown capacitance unit '{}'", other)),
    };
    Ok(number * multiplier)
}

fn format_capacitance(farads: f64) -> String {
    let (scale, unit) = if farads >= 1e-3 {
        (1e3, "mF")
    } else if farads >= 1e-6 {
        (1e6, "µF")
    } else if farads >= 1e-9 {
        (1e9, "nF")
    } else {
        (1e12, "pF")
    };
    format!("{:.3} {}", farads * scale, unit)
}
