// Command-line front end for the CMR liability check and the order report.
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use cmr_engine::config::EngineSettings;
use cmr_engine::data::csv_parser::OrderCsvParser;
use cmr_engine::data::order_store::OrderStore;
use cmr_engine::liability::{rate_line, FormFields, FormStep};
use cmr_engine::rates::ErApiClient;
use cmr_engine::reporting::build_report;
use cmr_engine::{fetch_reference_rate, LiabilityEvaluator, LiabilityReport, Locale, RateProvider};
use shared::models::RateQuote;

#[derive(Parser, Debug)]
#[command(name = "cmr-engine")]
#[command(about = "CMR carrier liability checker and order report")]
#[command(version)]
struct Cli {
    /// JSON settings file; built-in defaults are used for missing keys
    #[arg(long, global = true, env = "CMR_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a goods value against the carrier's CMR liability limit
    Check(CheckArgs),
    /// Show the current SDR reference rate and whether it is live
    Rate(RateArgs),
    /// Summarize a supply-chain order export
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Gross weight, e.g. "1000" or "250kg"; prompted for when omitted
    #[arg(long, allow_hyphen_values = true)]
    weight: Option<String>,

    /// Value of goods in EUR, e.g. "5000 €" or "6000,50"; prompted for when omitted
    #[arg(long, allow_hyphen_values = true)]
    value: Option<String>,

    /// SDR rate (EUR per XDR); fetched live when omitted
    #[arg(long, allow_hyphen_values = true)]
    rate: Option<String>,

    /// Skip the live lookup and use the configured fallback rate
    #[arg(long)]
    offline: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Message language: en or de
    #[arg(long)]
    lang: Option<Locale>,
}

#[derive(Args, Debug)]
struct RateArgs {
    #[arg(long)]
    lang: Option<Locale>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Order CSV (order_date, shipping_date, market, sales, actual_shipping_days)
    #[arg(short, long)]
    file: PathBuf,

    /// Markets to include (repeatable); all markets when omitted
    #[arg(short, long)]
    market: Vec<String>,

    /// Only list the markets present in the file
    #[arg(long)]
    list_markets: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let settings = EngineSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!(language = %settings.language, fallback_rate = settings.fallback_rate, "Settings loaded");

    match cli.command {
        Commands::Check(args) => run_check(&settings, args).await,
        Commands::Rate(args) => run_rate(&settings, args).await,
        Commands::Report(args) => run_report(args),
    }
}

fn rate_client(settings: &EngineSettings) -> Option<Arc<ErApiClient>> {
    match ErApiClient::from_settings(&settings.rate_service) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "Could not build rate client, using fallback rate");
            None
        }
    }
}

async fn run_check(settings: &EngineSettings, args: CheckArgs) -> Result<ExitCode> {
    let locale = match args.lang {
        Some(locale) => locale,
        None => settings.locale()?,
    };
    let interactive = io::stdin().is_terminal();
    let evaluator = LiabilityEvaluator::new();

    let mut fields = FormFields { weight: args.weight, value: args.value, rate: args.rate };
    // The form is usable right away; a live rate replaces the fallback once it arrives.
    let mut feed = fields.rate_feed(
        args.offline,
        || rate_client(settings).map(|client| client as Arc<dyn RateProvider>),
        settings.fallback_rate,
        settings.rate_service.timeout(),
    );
    if interactive && !args.json && fields.rate.is_none() {
        eprintln!("{}", rate_line(feed.current(), locale));
    }

    loop {
        for field in fields.missing() {
            fields.set(field, prompt(locale, field)?);
        }

        let step = fields.step(&evaluator, &mut feed, interactive).await?;
        let exit_code = step.exit_code();
        match step {
            FormStep::Done { result, quote } => {
                let report = LiabilityReport::new(result, Some(quote), locale);
                if args.json {
                    println!("{}", report.to_json()?);
                } else {
                    println!("{}", report);
                }
            }
            FormStep::Retry { error, field } => {
                eprintln!("{}", error);
                eprintln!("{}", locale.input_error_hint());
                fields.set(field, prompt(locale, field)?);
            }
            FormStep::Reject { error } => {
                eprintln!("{}", error);
                eprintln!("{}", locale.input_error_hint());
            }
        }
        if let Some(code) = exit_code {
            return Ok(ExitCode::from(code));
        }
    }
}

fn prompt(locale: Locale, field: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}: ", locale.field_label(field))?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("No input given for {}", field);
    }
    Ok(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string())
}

async fn run_rate(settings: &EngineSettings, args: RateArgs) -> Result<ExitCode> {
    let locale = match args.lang {
        Some(locale) => locale,
        None => settings.locale()?,
    };
    let quote = match rate_client(settings) {
        Some(client) => fetch_reference_rate(client.as_ref(), settings.rate_service.timeout())
            .await
            .into_quote(settings.fallback_rate),
        None => RateQuote::fallback(settings.fallback_rate),
    };
    println!("{}", rate_line(quote, locale));
    Ok(ExitCode::SUCCESS)
}

fn run_report(args: ReportArgs) -> Result<ExitCode> {
    if args.list_markets {
        let store = OrderStore::from_orders(OrderCsvParser::load_orders(&args.file)?);
        for market in store.markets() {
            println!("{}", market);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let summary = build_report(&args.file, &args.market)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.render(&source_name(&args.file)));
    }
    Ok(ExitCode::SUCCESS)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
