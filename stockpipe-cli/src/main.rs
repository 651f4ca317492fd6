//! stockpipe CLI: host setup, table store management and the ETL commands.
//!
//! Commands:
//! - `setup`: create the runtime env, install deps, lay out directories, write `.env`, init the db
//! - `db`: init, list, reset or drop tables in the embedded store
//! - `fetch`: print cleaned bars for symbols without storing them
//! - `load`: extract, clean and upsert bars into `stock_data`
//! - `report`: per-symbol averages, optionally exported as CSV
//! - `validate-tickers`: check symbols against the active asset list
//! - `summarize`: generate and store an AI summary for one symbol

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stockpipe_core::agent::{summarize_symbol, OpenAiClient};
use stockpipe_core::analysis::{symbol_averages, write_averages_csv, SymbolAverages};
use stockpipe_core::bootstrap::{BootstrapPlan, Bootstrapper};
use stockpipe_core::config::PipelineConfig;
use stockpipe_core::data::{
    process_stock_data, validate_tickers, AlpacaAssets, AlpacaProvider, AssetDirectory,
    CircuitBreaker, Credentials, Universe,
};
use stockpipe_core::domain::{format_timestamp, Timeframe};
use stockpipe_core::logging::{self, Verbosity};
use stockpipe_core::pipeline::{load_symbols, LoadRequest, TracingProgress};
use stockpipe_core::store::{init_pipeline_tables, TableStore};

#[derive(Parser)]
#[command(name = "stockpipe", about = "stockpipe: stock data ETL toolkit")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./stockpipe.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Only warnings and errors.
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare this host for the orchestration stack.
    Setup {
        /// Print the steps without running them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Table store management commands.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Fetch and print cleaned bars without storing them.
    Fetch {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Bar interval: minute, hour, day, week, month.
        #[arg(long, default_value_t = Timeframe::Hour)]
        timeframe: Timeframe,
    },
    /// Load bars into `stock_data` and print the resulting averages.
    Load {
        /// Symbols to load. Defaults to the configured universe.
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to yesterday.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Bar interval: minute, hour, day, week, month.
        #[arg(long, default_value_t = Timeframe::Hour)]
        timeframe: Timeframe,

        /// Take every N-th ticker of the universe (ignored when symbols are given).
        #[arg(long, default_value_t = 1)]
        stride: usize,
    },
    /// Print per-symbol averages over `stock_data`.
    Report {
        /// Also write the averages to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Check symbols against the active US equity list.
    ValidateTickers {
        /// Symbols to check. Defaults to the configured universe.
        symbols: Vec<String>,
    },
    /// Generate an AI summary for a symbol and store it.
    Summarize { symbol: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Create the pipeline tables if missing.
    Init,
    /// List tables with row counts.
    List,
    /// Drop every table.
    Reset {
        /// Actually drop (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
    /// Drop one table.
    Drop { table: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Setup { dry_run } => run_setup(&config, dry_run),
        Commands::Db { action } => match action {
            DbAction::Init => run_db_init(&config),
            DbAction::List => run_db_list(&config),
            DbAction::Reset { confirm } => run_db_reset(&config, confirm),
            DbAction::Drop { table } => run_db_drop(&config, &table),
        },
        Commands::Fetch {
            symbols,
            start,
            end,
            timeframe,
        } => run_fetch(&config, &symbols, &start, &end, timeframe),
        Commands::Load {
            symbols,
            start,
            end,
            timeframe,
            stride,
        } => run_load(&config, symbols, start, end, timeframe, stride),
        Commands::Report { csv } => run_report(&config, csv.as_deref()),
        Commands::ValidateTickers { symbols } => run_validate_tickers(&config, symbols),
        Commands::Summarize { symbol } => run_summarize(&config, &symbol),
    }
}

fn run_setup(config: &PipelineConfig, dry_run: bool) -> Result<()> {
    let plan = BootstrapPlan::from_config(config);
    let bootstrapper = Bootstrapper::default();

    if dry_run {
        for (i, line) in bootstrapper.dry_run(&plan).iter().enumerate() {
            println!("{}. {line}", i + 1);
        }
        println!();
        println!("Dry run, nothing was changed.");
        return Ok(());
    }

    let report = bootstrapper.run(&plan)?;
    println!("Setup complete: {} step(s).", report.completed.len());
    if !report.created_tables.is_empty() {
        println!("Created tables: {}", report.created_tables.join(", "));
    }
    Ok(())
}

fn open_store(config: &PipelineConfig) -> Result<TableStore> {
    let root = config.store_root();
    TableStore::open(&root).with_context(|| format!("opening store at {}", root.display()))
}

fn run_db_init(config: &PipelineConfig) -> Result<()> {
    let store = open_store(config)?;
    let created = init_pipeline_tables(&store)?;
    if created.is_empty() {
        println!("All pipeline tables already exist.");
    } else {
        for name in &created {
            println!("Created: {name}");
        }
    }
    Ok(())
}

fn run_db_list(config: &PipelineConfig) -> Result<()> {
    let store = open_store(config)?;
    let tables = store.list_tables()?;
    if tables.is_empty() {
        println!("No tables in {}", store.root().display());
        return Ok(());
    }

    println!("Store: {}", store.root().display());
    println!();
    println!("{:<20} {:>10} {:>10}  {:<25}", "Table", "Rows", "Size", "Updated");
    println!("{}", "-".repeat(70));
    for name in &tables {
        let meta = store.meta(name)?;
        let (rows, updated) = match meta {
            Some(m) => (m.row_count.to_string(), format_timestamp(&m.updated_at)),
            None => ("0".to_string(), "-".to_string()),
        };
        let size = dir_size(&store.root().join(format!("table={name}")));
        println!("{:<20} {:>10} {:>10}  {:<25}", name, rows, format_size(size), updated);
    }
    Ok(())
}

fn run_db_reset(config: &PipelineConfig, confirm: bool) -> Result<()> {
    let store = open_store(config)?;
    let tables = store.list_tables()?;
    if tables.is_empty() {
        println!("No tables to remove.");
        return Ok(());
    }

    println!("Found {} table(s):", tables.len());
    for name in &tables {
        println!("  {name}");
    }

    if !confirm {
        println!();
        println!("Dry run: pass --confirm to actually drop.");
        return Ok(());
    }

    let dropped = store.delete_all_tables()?;
    println!("Done. Dropped {dropped} table(s).");
    Ok(())
}

fn run_db_drop(config: &PipelineConfig, table: &str) -> Result<()> {
    let store = open_store(config)?;
    if store.delete_table(table)? {
        println!("Dropped: {table}");
    } else {
        println!("Table does not exist: {table}");
    }
    Ok(())
}

fn alpaca_provider(config: &PipelineConfig) -> Result<AlpacaProvider> {
    let credentials = Credentials::from_config(config)?;
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(AlpacaProvider::new(&config.alpaca, credentials, circuit_breaker)?)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn run_fetch(
    config: &PipelineConfig,
    symbols: &[String],
    start: &str,
    end: &str,
    timeframe: Timeframe,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let provider = alpaca_provider(config)?;

    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        let bars = process_stock_data(&provider, &symbol, start, end, timeframe)?;
        println!();
        println!("=== {symbol} ({} bars, {timeframe}) ===", bars.len());
        println!(
            "{:<25} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "Timestamp", "Open", "High", "Low", "Close", "Volume"
        );
        for bar in &bars {
            println!(
                "{:<25} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>12}",
                bar.display_timestamp(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            );
        }
    }
    Ok(())
}

fn run_load(
    config: &PipelineConfig,
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    timeframe: Timeframe,
    stride: usize,
) -> Result<()> {
    let end_date = end
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let start_date = start
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| end_date - chrono::Duration::days(1));
    if start_date > end_date {
        bail!("--start {start_date} is after --end {end_date}");
    }

    let (universe, step) = if symbols.is_empty() {
        (Universe::new(config.universe.tickers.iter()), stride)
    } else {
        (Universe::new(symbols.iter()), 1)
    };
    let selected = universe.stride(step);
    if selected.is_empty() {
        bail!("no symbols to load");
    }

    let provider = alpaca_provider(config)?;
    let store = open_store(config)?;
    init_pipeline_tables(&store)?;

    let request = LoadRequest {
        start: start_date,
        end: end_date,
        timeframe,
    };
    let summary = load_symbols(&provider, &store, &selected, &request, &TracingProgress);

    print_averages(&symbol_averages(&store)?);

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_report(config: &PipelineConfig, csv: Option<&Path>) -> Result<()> {
    let store = open_store(config)?;
    init_pipeline_tables(&store)?;
    let rows = symbol_averages(&store)?;
    print_averages(&rows);

    if let Some(path) = csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_averages_csv(&rows, file)?;
        println!("Wrote {} row(s) to {}", rows.len(), path.display());
    }
    Ok(())
}

fn run_validate_tickers(config: &PipelineConfig, symbols: Vec<String>) -> Result<()> {
    let tickers: Vec<String> = if symbols.is_empty() {
        config.universe.tickers.clone()
    } else {
        symbols.iter().map(|s| s.trim().to_uppercase()).collect()
    };

    let credentials = Credentials::from_config(config)?;
    let directory = AlpacaAssets::new(&config.alpaca, credentials)?;
    let known = directory.active_symbols()?;
    let check = validate_tickers(&tickers, &known);

    println!("Valid ({}): {}", check.valid.len(), check.valid.join(", "));
    println!("Invalid ({}): {}", check.invalid.len(), check.invalid.join(", "));

    if !check.all_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_summarize(config: &PipelineConfig, symbol: &str) -> Result<()> {
    let symbol = symbol.trim().to_uppercase();
    let store = open_store(config)?;
    init_pipeline_tables(&store)?;
    let client = OpenAiClient::from_config(config)?;

    let text = summarize_symbol(&client, &store, &symbol, &config.agent.model)?;
    println!();
    println!("=== {symbol} ===");
    println!("{text}");
    Ok(())
}

fn print_averages(rows: &[SymbolAverages]) {
    if rows.is_empty() {
        println!("No bars stored.");
        return;
    }
    println!();
    println!(
        "{:<8} {:>8} {:>12} {:>12} {:>16}",
        "Symbol", "Bars", "Avg Open", "Avg Close", "Avg Volume"
    );
    println!("{}", "-".repeat(60));
    for r in rows {
        println!(
            "{:<8} {:>8} {:>12.4} {:>12.4} {:>16.1}",
            r.symbol, r.bar_count, r.avg_open, r.avg_close, r.avg_volume
        );
    }
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
