use analyzer::{AnalysisReport, ReportBuildError};
use api_client::error::ApiError;
use api_client::{PriceSource, YahooClient};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{Config, CorrelationMethod};
use core_types::{ErrorKind, RawObservation, Symbol};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use price_cache::{CacheError, CsvPriceCache};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

/// The main entry point for the Market Pulse application.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e:#}", error_kind(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = configuration::load_config_from(&cli.config)?;
    let _guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Fetch(args) => handle_fetch(args, &config).await,
        Commands::Analyze(args) => {
            args.analysis.apply(&mut config)?;
            handle_analyze(args, &config).await
        }
        Commands::Serve(args) => {
            args.analysis.apply(&mut config)?;
            if let Some(port) = args.port {
                config.server.port = port;
            }
            handle_serve(args, &config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Return, risk and correlation analysis of daily equity closes.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily closes for the universe and cache them locally.
    Fetch(FetchArgs),
    /// Build an analysis report and print it.
    Analyze(AnalyzeArgs),
    /// Build an analysis report and serve it as a JSON API.
    Serve(ServeArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Symbols to use instead of the configured universe (comma separated).
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Start date (format: YYYY-MM-DD); defaults to `data.start_date`.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End date (format: YYYY-MM-DD); defaults to `data.end_date` or today.
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl DataArgs {
    fn symbols(&self, config: &Config) -> Vec<Symbol> {
        if self.symbols.is_empty() {
            config.universe.symbols()
        } else {
            self.symbols.iter().map(|s| s.trim().to_uppercase()).collect()
        }
    }

    fn range(&self, config: &Config) -> anyhow::Result<(NaiveDate, NaiveDate)> {
        let (start, end) = config.data.date_range(Utc::now().date_naive());
        let (start, end) = (self.from.unwrap_or(start), self.to.unwrap_or(end));
        if end < start {
            anyhow::bail!("end date {end} is before start date {start}");
        }
        Ok((start, end))
    }
}

#[derive(Args)]
struct AnalysisArgs {
    /// Rolling volatility window in trading days.
    #[arg(long)]
    window: Option<usize>,

    /// Annual risk-free rate for the Sharpe ratio (0.02 for 2%).
    #[arg(long)]
    risk_free_rate: Option<f64>,

    /// Correlation coefficient to compute.
    #[arg(long, value_enum)]
    method: Option<CorrelationMethod>,

    /// Symbol to measure betas against.
    #[arg(long)]
    benchmark: Option<String>,
}

impl AnalysisArgs {
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(window) = self.window {
            config.analysis.volatility_window = window;
        }
        if let Some(rate) = self.risk_free_rate {
            config.analysis.risk_free_rate = rate;
        }
        if let Some(method) = self.method {
            config.analysis.correlation_method = method;
        }
        if let Some(benchmark) = &self.benchmark {
            config.analysis.benchmark = Some(benchmark.to_uppercase());
        }
        config.validate()?;
        Ok(())
    }
}

#[derive(Args)]
struct FetchArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Download again even when the range is already cached.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Only use cached prices; never touch the network.
    #[arg(long)]
    offline: bool,

    /// Also write the full report as JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Only use cached prices; never touch the network.
    #[arg(long)]
    offline: bool,

    /// Port to listen on instead of `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_fetch(args: FetchArgs, config: &Config) -> anyhow::Result<()> {
    let symbols = args.data.symbols(config);
    let (start, end) = args.data.range(config)?;
    let cache = CsvPriceCache::new(&config.data.cache_dir);

    let pending: Vec<Symbol> = if args.force {
        symbols
    } else {
        let mut pending = Vec::new();
        for symbol in symbols {
            if cache.load(&symbol, start, end)?.is_some() {
                println!("{symbol}: already cached");
            } else {
                pending.push(symbol);
            }
        }
        pending
    };
    if pending.is_empty() {
        return Ok(());
    }

    let client = YahooClient::from_settings(&config.data)?;
    let fetched = fetch_all(&client, &pending, start, end).await;

    let mut failures = Vec::new();
    for (symbol, result) in fetched {
        match result {
            Ok(observations) => {
                let path = cache.save(&symbol, start, end, &observations)?;
                println!("{symbol}: {} rows -> {}", observations.len(), path.display());
            }
            Err(e) => {
                eprintln!("{symbol}: {e}");
                failures.push(e);
            }
        }
    }

    match failures.into_iter().next() {
        Some(first) => Err(first.into()),
        None => Ok(()),
    }
}

async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let symbols = args.data.symbols(config);
    let (start, end) = args.data.range(config)?;
    let raw = load_raw(&symbols, start, end, args.offline, config).await?;

    let report = AnalysisReport::build_from_raw(&symbols, &raw, config)?;
    print_report(&report);

    if let Some(path) = args.output {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, &report)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let symbols = args.data.symbols(config);
    let (start, end) = args.data.range(config)?;
    let raw = load_raw(&symbols, start, end, args.offline, config).await?;

    let report = AnalysisReport::build_from_raw(&symbols, &raw, config)?;
    let addr = config.server.socket_addr()?;
    web_server::run_server(addr, report).await
}

/// Reads every symbol from the cache, downloading (and caching) the misses.
///
/// All symbols are resident before this returns, so the report is only built
/// over a complete set.
async fn load_raw(
    symbols: &[Symbol],
    start: NaiveDate,
    end: NaiveDate,
    offline: bool,
    config: &Config,
) -> anyhow::Result<HashMap<Symbol, Vec<RawObservation>>> {
    let cache = CsvPriceCache::new(&config.data.cache_dir);
    let mut raw = HashMap::new();
    let mut missing = Vec::new();

    for symbol in symbols {
        match cache.load(symbol, start, end)? {
            Some(observations) => {
                raw.insert(symbol.clone(), observations);
            }
            None => missing.push(symbol.clone()),
        }
    }
    if missing.is_empty() {
        return Ok(raw);
    }

    if offline {
        return Err(ApiError::DataUnavailable {
            symbol: missing.join(","),
            reason: format!("not cached for {start}..{end} and --offline was given"),
        }
        .into());
    }

    tracing::info!(missing = ?missing, "Fetching prices not found in cache");
    let client = YahooClient::from_settings(&config.data)?;
    for (symbol, result) in fetch_all(&client, &missing, start, end).await {
        let observations = result?;
        cache.save(&symbol, start, end, &observations)?;
        raw.insert(symbol, observations);
    }
    Ok(raw)
}

/// Fetches all symbols concurrently behind a progress bar.
async fn fetch_all<S: PriceSource>(
    source: &S,
    symbols: &[Symbol],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(Symbol, Result<Vec<RawObservation>, ApiError>)> {
    let progress_bar = ProgressBar::new(symbols.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress_bar.set_style(style.progress_chars("#>-"));
    }

    let tasks = symbols.iter().map(|symbol| {
        let pb = progress_bar.clone();
        async move {
            let result = source.fetch_daily_closes(symbol, start, end).await;
            pb.inc(1);
            pb.set_message(format!("{symbol} done"));
            (symbol.clone(), result)
        }
    });
    let results = join_all(tasks).await;

    progress_bar.finish_with_message("Fetch complete");
    results
}

// ==============================================================================
// Output
// ==============================================================================

fn print_report(report: &AnalysisReport) {
    let params = report.params();
    println!(
        "Run {} | window {} | risk-free {:.2}% | {:?} correlation",
        report.run_id(),
        params.volatility_window,
        params.risk_free_rate * 100.0,
        params.correlation_method
    );

    let mut risk = Table::new();
    risk.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Rank",
            "Symbol",
            "Sector",
            "Total return",
            "Ann. return",
            "Ann. volatility",
            "Sharpe",
            "Max drawdown",
            "Beta",
        ]);
    for ranked in report.ranking() {
        let Some(analysis) = report.analysis(&ranked.symbol) else {
            continue;
        };
        let profile = &analysis.risk;
        risk.add_row(vec![
            Cell::new(ranked.rank).set_alignment(CellAlignment::Right),
            Cell::new(&profile.symbol),
            Cell::new(analysis.sector.map(|s| s.to_string()).unwrap_or_default()),
            Cell::new(percent(profile.cumulative_return)),
            Cell::new(percent(profile.annualized_return)),
            Cell::new(percent(profile.annualized_volatility)),
            Cell::new(optional(profile.sharpe_ratio)),
            Cell::new(percent(-profile.max_drawdown)),
            Cell::new(optional(profile.beta)),
        ]);
    }
    println!("\n{risk}");

    let matrix = report.correlation();
    let (first, last) = matrix.date_range();
    let mut correlation = Table::new();
    correlation.load_preset(UTF8_FULL);
    let mut header = vec![String::new()];
    header.extend(matrix.symbols().iter().cloned());
    correlation.set_header(header);
    for (symbol, row) in matrix.symbols().iter().zip(matrix.rows()) {
        let mut cells = vec![Cell::new(symbol)];
        cells.extend(row.iter().map(|c| {
            Cell::new(c.map(|c| format!("{c:.3}")).unwrap_or_else(|| "n/a".to_string()))
        }));
        correlation.add_row(cells);
    }
    println!(
        "\nCorrelation over {} common dates ({first} to {last})\n{correlation}",
        matrix.common_dates()
    );

    if let Some((a, b, c)) = matrix.strongest_pair() {
        println!("Most correlated pair: {a} / {b} ({c:.3})");
    }
    if let Some(mean) = matrix.mean_off_diagonal() {
        println!("Average pairwise correlation: {mean:.3}");
    }
    if let (Some(best), Some(worst)) = (report.best_performer(), report.worst_performer()) {
        println!(
            "Best performer: {} ({}), worst: {} ({})",
            best.symbol,
            percent(best.cumulative_return),
            worst.symbol,
            percent(worst.cumulative_return)
        );
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string())
}

/// The error kind presentation layers report alongside the message.
fn error_kind(error: &anyhow::Error) -> ErrorKind {
    if let Some(e) = error.downcast_ref::<ReportBuildError>() {
        e.kind()
    } else if let Some(e) = error.downcast_ref::<ApiError>() {
        e.kind()
    } else if let Some(e) = error.downcast_ref::<CacheError>() {
        e.kind()
    } else if error.downcast_ref::<configuration::error::ConfigError>().is_some() {
        ErrorKind::InvalidInput
    } else {
        ErrorKind::Internal
    }
}
