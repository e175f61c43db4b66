//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::cadence::{parse_cadence_list, resolve, Cadence};
use crate::domain::comparison::{compare_with, ComparisonTable, Projection};
use crate::domain::config_validation::{parse_date, validate_fee_config, validate_simulation_config};
use crate::domain::error::DcaError;
use crate::domain::fees::{compute_fee, FeeParameters};
use crate::domain::price::PriceBar;
use crate::domain::simulation::{run_simulation, DcaConfig};
use crate::domain::summary::{months_between, Summary};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "dcasim", about = "Dollar-cost averaging simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate one investment cadence
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        cadence: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare cadences over the same price history
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        /// Comma-separated cadence names
        #[arg(long)]
        cadences: Option<String>,
        /// Cadence the other columns are reported relative to
        #[arg(long)]
        reference: Option<String>,
        /// Only keep bars where a cadence bought shares
        #[arg(long)]
        trade_bars: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Quote the fee for a single order
    FeeQuote {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "1")]
        shares: Decimal,
        #[arg(long, default_value = "1")]
        price: Decimal,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a run needs, resolved from config and CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dca: DcaConfig,
    pub data_path: PathBuf,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            ticker,
            cadence,
            output,
        } => run_simulate(&config, ticker.as_deref(), cadence.as_deref(), output.as_ref()),
        Command::Compare {
            config,
            ticker,
            cadences,
            reference,
            trade_bars,
            output,
        } => run_compare(
            &config,
            ticker.as_deref(),
            cadences.as_deref(),
            reference.as_deref(),
            trade_bars,
            output.as_ref(),
        ),
        Command::FeeQuote {
            config,
            shares,
            price,
        } => run_fee_quote(config.as_ref(), shares, price),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    }
}

fn fail(err: DcaError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(DcaError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

fn load_validated(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    let adapter = load_config(path)?;
    validate_simulation_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

pub fn build_fee_parameters(adapter: &dyn ConfigPort) -> FeeParameters {
    let fee = |key: &str| adapter.get_decimal("fees", key, Decimal::ZERO);
    FeeParameters {
        commission_per_share: fee("commission_per_share"),
        commission_min_per_order: fee("commission_min_per_order"),
        commission_max_pct: fee("commission_max_pct"),
        platform_fee_per_share: fee("platform_fee_per_share"),
        platform_fee_min_per_order: fee("platform_fee_min_per_order"),
        platform_fee_max_pct: fee("platform_fee_max_pct"),
    }
}

pub fn build_run_settings(
    adapter: &dyn ConfigPort,
    ticker_override: Option<&str>,
    cadence_override: Option<&str>,
) -> Result<RunSettings, DcaError> {
    let ticker = match ticker_override {
        Some(t) => t.to_string(),
        None => adapter
            .get_string("simulation", "ticker")
            .ok_or_else(|| DcaError::ConfigMissing {
                section: "simulation".into(),
                key: "ticker".into(),
            })?,
    }
    .trim()
    .to_uppercase();

    let start_date = parse_date(
        adapter.get_string("simulation", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("simulation", "end_date").as_deref(),
        "end_date",
    )?;

    let cadence_name = cadence_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("simulation", "cadence"))
        .unwrap_or_else(|| Cadence::Weekly.to_string());

    Ok(RunSettings {
        ticker,
        start_date,
        end_date,
        dca: DcaConfig {
            cadence: resolve(&cadence_name)?,
            contribution_amount: adapter.get_decimal("simulation", "contribution", dec!(100)),
            fees: build_fee_parameters(adapter),
        },
        data_path: PathBuf::from(
            adapter
                .get_string("data", "path")
                .unwrap_or_else(|| "data".to_string()),
        ),
    })
}

/// Cadences to compare: the override, else `[compare] cadences`, else all four.
/// A list that names no cadence at all is `EmptyCadenceSet`.
pub fn resolve_compare_cadences(
    cadences_override: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<Vec<Cadence>, DcaError> {
    let cadences = match cadences_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("compare", "cadences"))
    {
        Some(list) => parse_cadence_list(&list)?,
        None => Cadence::ALL.to_vec(),
    };
    if cadences.is_empty() {
        return Err(DcaError::EmptyCadenceSet);
    }
    Ok(cadences)
}

fn fetch_prices(data_port: &dyn PriceDataPort, settings: &RunSettings) -> Result<Vec<PriceBar>, DcaError> {
    info!(
        ticker = %settings.ticker,
        start = %settings.start_date,
        end = %settings.end_date,
        "fetching prices"
    );
    let prices = data_port.fetch_prices(&settings.ticker, settings.start_date, settings.end_date)?;
    if prices.is_empty() {
        return Err(DcaError::NoData {
            ticker: settings.ticker.clone(),
        });
    }
    info!(bars = prices.len(), "prices loaded");
    Ok(prices)
}

fn run_simulate(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    cadence_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match build_run_settings(&adapter, ticker_override, cadence_override) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = CsvPriceAdapter::new(settings.data_path.clone());

    match run_simulation_pipeline(&data_port, &CsvReportAdapter::new(), &settings, output_path) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

/// Fetch, simulate, print the summary and optionally write the per-bar report.
pub fn run_simulation_pipeline(
    data_port: &dyn PriceDataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
    output_path: Option<&PathBuf>,
) -> Result<Summary, DcaError> {
    let prices = fetch_prices(data_port, settings)?;

    info!(cadence = %settings.dca.cadence, "running simulation");
    let records = run_simulation(&prices, &settings.dca)?;

    let months = months_between(settings.start_date, settings.end_date);
    let summary = Summary::compute(&records, months).ok_or(DcaError::EmptyPriceSeries)?;
    print_summary(settings, &summary);

    if let Some(path) = output_path {
        report_port.write_records(&records, &path.to_string_lossy())?;
        eprintln!("\nReport written to: {}", path.display());
    }
    Ok(summary)
}

fn print_summary(settings: &RunSettings, summary: &Summary) {
    let fees = &settings.dca.fees;
    eprintln!(
        "\n=== {} {} DCA, {} to {} ===",
        settings.ticker, settings.dca.cadence, settings.start_date, settings.end_date
    );
    eprintln!("Total Invested:        ${:.2}", summary.total_contributed);
    eprintln!("Total Gain:            ${:.2}", summary.total_gain);
    eprintln!("Final Portfolio Value: ${:.2}", summary.final_portfolio_value);
    eprintln!("Percentage Gain:       {:.2}%", summary.percentage_gain * dec!(100));
    eprintln!("Annualized Gain:       {:.2}%", summary.annualized_gain * 100.0);
    eprintln!("Loss Frequency:        {:.2}%", summary.loss_frequency * 100.0);
    eprintln!("Trades:                {}", summary.trade_count);
    eprintln!("Total Fees:            ${:.2}", summary.total_fees);
    eprintln!("Fees / Cash:           {:.2}%", summary.fee_ratio * dec!(100));
    eprintln!(
        "Minimum fee per trade: ${:.2} (break-even take profit ${:.2})",
        fees.minimum_trade_fee(),
        fees.breakeven_profit()
    );
}

fn run_compare(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    cadences_override: Option<&str>,
    reference_override: Option<&str>,
    trade_bars: bool,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match build_run_settings(&adapter, ticker_override, None) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let cadences = match resolve_compare_cadences(cadences_override, &adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let reference = match reference_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("compare", "reference"))
    {
        Some(name) => match resolve(&name) {
            Ok(c) => c,
            Err(e) => return fail(e),
        },
        None => settings.dca.cadence,
    };
    let projection = if trade_bars || adapter.get_bool("compare", "trade_bars", false) {
        Projection::TradeBars
    } else {
        Projection::AllBars
    };

    let data_port = CsvPriceAdapter::new(settings.data_path.clone());
    match run_compare_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        &settings,
        &cadences,
        reference,
        projection,
        output_path,
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

/// Fetch, compare, print final relative performance and optionally write the
/// table. Returns the absolute (not reference-relative) table.
pub fn run_compare_pipeline(
    data_port: &dyn PriceDataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
    cadences: &[Cadence],
    reference: Cadence,
    projection: Projection,
    output_path: Option<&PathBuf>,
) -> Result<ComparisonTable, DcaError> {
    let prices = fetch_prices(data_port, settings)?;

    let names: Vec<&str> = cadences.iter().map(|c| c.name()).collect();
    let table = compare_with(
        &names,
        &prices,
        settings.dca.contribution_amount,
        &settings.dca.fees,
        projection,
    )?;

    eprintln!(
        "\n=== {} cadence comparison, {} rows ===",
        settings.ticker,
        table.len()
    );
    for &cadence in &table.cadences {
        match table.column(cadence).last() {
            Some((date, perf)) => eprintln!(
                "  {:<11} {:>8.2}%  (as of {})",
                cadence.name(),
                *perf * dec!(100),
                date
            ),
            None => eprintln!("  {:<11} no data", cadence.name()),
        }
    }

    if let Some(path) = output_path {
        let relative = match table.relative_to(reference) {
            Some(t) => {
                eprintln!("Reported relative to {}", reference);
                t
            }
            None => {
                tracing::warn!(%reference, "reference cadence not compared; writing absolute values");
                table.clone()
            }
        };
        report_port.write_comparison(&relative, &path.to_string_lossy())?;
        eprintln!("\nReport written to: {}", path.display());
    }
    Ok(table)
}

fn run_fee_quote(config_path: Option<&PathBuf>, shares: Decimal, price: Decimal) -> ExitCode {
    let fees = match config_path {
        Some(path) => match load_config(path) {
            Ok(adapter) => match load_fee_parameters(&adapter) {
                Ok(fees) => fees,
                Err(e) => return fail(e),
            },
            Err(code) => return code,
        },
        None => FeeParameters::default(),
    };

    match quote_fee(&fees, shares, price) {
        Ok((trade_value, fee)) => {
            println!("Trade value: ${:.2}", trade_value);
            println!("Total fee:   ${:.2}", fee);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Validated `[fees]` section; only the fee keys are required to be well formed.
pub fn load_fee_parameters(adapter: &dyn ConfigPort) -> Result<FeeParameters, DcaError> {
    validate_fee_config(adapter)?;
    Ok(build_fee_parameters(adapter))
}

/// `(trade_value, fee)` for one order of `shares` at `price`.
pub fn quote_fee(
    fees: &FeeParameters,
    shares: Decimal,
    price: Decimal,
) -> Result<(Decimal, Decimal), DcaError> {
    let invalid = |reason: &str| DcaError::ConfigInvalid {
        section: "fee-quote".into(),
        key: "shares/price".into(),
        reason: reason.into(),
    };
    if shares < Decimal::ZERO || price < Decimal::ZERO {
        return Err(invalid("must be non-negative"));
    }
    let trade_value = shares.checked_mul(price).ok_or_else(|| invalid("order is too large"))?;
    shares
        .checked_mul(fees.per_share())
        .and_then(|_| trade_value.checked_mul(fees.max_pct()))
        .ok_or_else(|| invalid("order is too large"))?;
    Ok((trade_value, compute_fee(shares, trade_value, fees)))
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match build_run_settings(&adapter, None, None) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("Ticker:       {}", settings.ticker);
    eprintln!("Period:       {} to {}", settings.start_date, settings.end_date);
    eprintln!("Cadence:      {} (every {} trading days)", settings.dca.cadence, settings.dca.cadence.step());
    eprintln!("Contribution: ${:.2}", settings.dca.contribution_amount);
    eprintln!("Data path:    {}", settings.data_path.display());
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_tickers(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let data_path = adapter
        .get_string("data", "path")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvPriceAdapter::new(PathBuf::from(&data_path));

    match data_port.list_tickers() {
        Ok(tickers) if tickers.is_empty() => {
            eprintln!("No tickers found in {}", data_path);
            ExitCode::SUCCESS
        }
        Ok(tickers) => {
            for ticker in &tickers {
                println!("{}", ticker);
            }
            eprintln!("{} tickers found", tickers.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
