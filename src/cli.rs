//! CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::simulated_brokerage::SimulatedBrokerage;
use crate::domain::analysis::{LiveAnalysis, TickerAnalysis};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    parse_date, read_decimal, validate_analysis_config, validate_backtest_config,
    validate_data_config, validate_strategy_config,
};
use crate::domain::date_range::HistoryRange;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::rule::Rule;
use crate::domain::rule_parser;
use crate::domain::strategy::Strategy;
use crate::ports::brokerage_port::BrokeragePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceHistoryPort;
use crate::ports::report_port::{BacktestReport, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Equity strategy backtester and signal scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Scan recent history for buy signals
    Analyse {
        #[arg(short, long)]
        config: PathBuf,
        /// Analysis date, YYYY-MM-DD (default today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategy,
            ticker,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, strategy.as_deref())
            } else {
                run_backtest(&config, strategy.as_deref(), ticker.as_deref())
            }
        }
        Command::Analyse {
            config,
            date,
            ticker,
        } => run_analyse(&config, date, ticker.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| SigtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    ticker_override: Option<&str>,
) -> Result<BacktestConfig, SigtraderError> {
    let ticker = match ticker_override {
        Some(t) => t.trim().to_uppercase(),
        None => adapter
            .get_string("backtest", "ticker")
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: "backtest".into(),
                key: "ticker".into(),
            })?,
    };

    let start_date = required_date(adapter, "start_date")?;
    let end_date = required_date(adapter, "end_date")?;
    let initial_funds = read_decimal(adapter, "backtest", "initial_funds")?.ok_or_else(|| {
        SigtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "initial_funds".into(),
        }
    })?;

    Ok(BacktestConfig {
        ticker,
        start_date,
        end_date,
        initial_funds,
        fee_flat: adapter.get_decimal("backtest", "fee_flat", Decimal::ZERO),
        fee_percent: adapter.get_decimal("backtest", "fee_percent", Decimal::ZERO),
        interest_rate: adapter.get_decimal("backtest", "interest_rate", Decimal::ZERO),
    })
}

fn required_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SigtraderError> {
    let raw = adapter
        .get_string("backtest", key)
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "backtest".into(),
            key: key.into(),
        })?;
    parse_date(&raw, "backtest", key)
}

fn parse_rule_key(adapter: &dyn ConfigPort, key: &str) -> Result<Rule, SigtraderError> {
    let text = adapter
        .get_string("strategy", key)
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "strategy".into(),
            key: key.into(),
        })?;
    rule_parser::parse_rule(&text).inspect_err(|e| {
        if let SigtraderError::RuleParse(parse_error) = e {
            error!(
                "failed to parse {key}:\n{}",
                parse_error.display_with_context(&text)
            );
        }
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, SigtraderError> {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "Unnamed".to_string());
    let description = adapter
        .get_string("strategy", "description")
        .unwrap_or_default();

    Ok(Strategy {
        name,
        description,
        entry: parse_rule_key(adapter, "entry")?,
        exit: parse_rule_key(adapter, "exit")?,
    })
}

pub fn build_live_analysis(adapter: &dyn ConfigPort) -> Result<LiveAnalysis, SigtraderError> {
    let text = adapter
        .get_string("analysis", "filter")
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "analysis".into(),
            key: "filter".into(),
        })?;
    let filter = rule_parser::parse_filter(&text).inspect_err(|e| {
        if let SigtraderError::RuleParse(parse_error) = e {
            error!(
                "failed to parse filter:\n{}",
                parse_error.display_with_context(&text)
            );
        }
    })?;
    let rolling_days = u32::try_from(adapter.get_int("analysis", "rolling_days", 1)).map_err(
        |_| SigtraderError::ConfigInvalid {
            section: "analysis".into(),
            key: "rolling_days".into(),
            reason: "rolling_days must be at least 1".into(),
        },
    )?;
    LiveAnalysis::new(filter, rolling_days)
}

pub fn resolve_tickers(ticker_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(t) = ticker_override {
        return vec![t.trim().to_uppercase()];
    }

    config
        .get_string("analysis", "tickers")
        .map(|list| {
            list.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn data_directory(config: &dyn ConfigPort) -> Result<PathBuf, SigtraderError> {
    validate_data_config(config)?;
    config
        .get_string("data", "directory")
        .map(PathBuf::from)
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })
}

/// Load the strategy from its own file when given, else from the main config.
fn load_strategy(
    adapter: &FileConfigAdapter,
    strategy_path: Option<&Path>,
) -> Result<Strategy, SigtraderError> {
    let strategy = match strategy_path {
        Some(path) => {
            let strategy_adapter = load_config(path)?;
            validate_strategy_config(&strategy_adapter)?;
            build_strategy(&strategy_adapter)?
        }
        None => {
            validate_strategy_config(adapter)?;
            build_strategy(adapter)?
        }
    };
    info!("Loaded strategy: {}", strategy.name);
    Ok(strategy)
}

fn run_backtest(
    config_path: &Path,
    strategy_path: Option<&Path>,
    ticker_override: Option<&str>,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let directory = data_directory(&adapter)?;
    validate_backtest_config(&adapter)?;
    let strategy = load_strategy(&adapter, strategy_path)?;
    let bt_config = build_backtest_config(&adapter, ticker_override)?;

    let data_port = CsvAdapter::new(directory);
    let mut report = ConsoleReport::stdout();
    run_backtest_pipeline(&data_port, &mut report, &strategy, &bt_config)?;
    Ok(())
}

pub fn run_backtest_pipeline(
    data_port: &dyn PriceHistoryPort,
    report: &mut dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
) -> Result<Metrics, SigtraderError> {
    let range = bt_config.history_range()?;
    let lead_in = strategy.required_trading_prices();
    let prices = data_port.fetch(&bt_config.ticker, range.with_lead_in(lead_in)?)?;
    info!("Fetched {} bars for {}", prices.len(), bt_config.ticker);

    let mut brokerage = SimulatedBrokerage::from_config(bt_config)?;
    let run = backtest_engine::run_backtest(
        strategy,
        &bt_config.ticker,
        prices,
        range,
        &mut brokerage,
    )?;

    let risk_free_rate = bt_config.interest_rate.to_f64().unwrap_or(0.0);
    let metrics = Metrics::compute(brokerage.portfolio(), risk_free_rate);

    report.write_backtest(&BacktestReport {
        strategy,
        config: bt_config,
        run: &run,
        portfolio: brokerage.portfolio(),
        metrics: &metrics,
    })?;
    Ok(metrics)
}

fn run_analyse(
    config_path: &Path,
    date: Option<NaiveDate>,
    ticker_override: Option<&str>,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let directory = data_directory(&adapter)?;
    validate_analysis_config(&adapter)?;
    let analysis = build_live_analysis(&adapter)?;
    let tickers = resolve_tickers(ticker_override, &adapter);
    let as_of = date.unwrap_or_else(|| Local::now().date_naive());

    let data_port = CsvAdapter::new(directory);
    let mut report = ConsoleReport::stdout();
    run_analysis_pipeline(&data_port, &mut report, &analysis, &tickers, as_of)?;
    Ok(())
}

/// Analyse each ticker in turn; tickers that cannot be analysed are skipped.
pub fn run_analysis_pipeline(
    data_port: &dyn PriceHistoryPort,
    report: &mut dyn ReportPort,
    analysis: &LiveAnalysis,
    tickers: &[String],
    as_of: NaiveDate,
) -> Result<Vec<TickerAnalysis>, SigtraderError> {
    let end = as_of
        .succ_opt()
        .ok_or_else(|| SigtraderError::invalid_configuration("analysis date out of range"))?;
    let range = HistoryRange::new(as_of, end)?.with_lead_in(analysis.required_trading_days())?;

    info!("Analysing {} ticker(s) as of {}", tickers.len(), as_of);
    let mut results = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let outcome = data_port
            .fetch(ticker, range)
            .and_then(|prices| analysis.analyse(ticker, prices, as_of));
        match outcome {
            Ok(result) => {
                report.write_analysis(&result)?;
                results.push(result);
            }
            Err(e) => warn!("skipping {} ({})", ticker, e),
        }
    }

    if results.is_empty() {
        return Err(SigtraderError::NoData {
            ticker: tickers.join(","),
        });
    }
    Ok(results)
}

pub fn run_dry_run(config_path: &Path, strategy_path: Option<&Path>) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let directory = data_directory(&adapter)?;
    validate_backtest_config(&adapter)?;
    let strategy = load_strategy(&adapter, strategy_path)?;
    let bt_config = build_backtest_config(&adapter, None)?;
    info!("Config validated successfully");

    info!("Strategy rules (parsed):");
    info!("  entry: {}", strategy.entry);
    info!("  exit:  {}", strategy.exit);

    let mut indicators: Vec<String> = strategy.indicators().iter().map(|i| i.to_string()).collect();
    indicators.sort();
    info!("Generators to run:");
    for indicator in &indicators {
        info!("  {}", indicator);
    }
    info!(
        "Lead-in: {} trading days",
        strategy.required_trading_prices()
    );
    info!(
        "Ticker {} from {} to {} (data in {})",
        bt_config.ticker,
        bt_config.start_date,
        bt_config.end_date,
        directory.display()
    );
    info!("Dry run complete: configuration is valid");
    Ok(())
}

pub fn run_validate(strategy_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_config(strategy_path)?;
    validate_strategy_config(&adapter)?;
    let strategy = build_strategy(&adapter)?;

    info!("Entry rule: {}", strategy.entry);
    info!("Exit rule:  {}", strategy.exit);
    info!(
        "Strategy configuration is valid ({} trading days of lead-in)",
        strategy.required_trading_prices()
    );
    Ok(())
}
