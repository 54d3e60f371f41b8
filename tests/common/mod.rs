#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sigtrader::domain::analysis::TickerAnalysis;
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::date_range::HistoryRange;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::price::TradingDayPrice;
use sigtrader::domain::rule_parser::parse_rule;
use sigtrader::domain::strategy::Strategy;
use sigtrader::ports::data_port::PriceHistoryPort;
use sigtrader::ports::report_port::{BacktestReport, ReportPort};
use std::collections::HashMap;
use std::str::FromStr;

/// SMA(2) crosses above SMA(3) on days 5, 10 and 16 and below on days 7, 13
/// and 19, counting from 2024-01-01.
pub const CROSSING_CLOSES: [&str; 20] = [
    "10", "9", "8", "7", "6", "9", "12", "5", "3", "4", "6", "8", "7", "5", "4", "6", "9", "11",
    "10", "8",
];

pub struct MockPriceHistory {
    pub data: HashMap<String, Vec<TradingDayPrice>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceHistory {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<TradingDayPrice>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceHistory {
    fn fetch(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<Vec<TradingDayPrice>, SigtraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| range.contains(b.date))
                .copied()
                .collect()),
            None => Err(SigtraderError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }
}

/// Collects rendered summaries instead of printing them.
#[derive(Default)]
pub struct CollectingReport {
    pub backtests: Vec<(String, Decimal, usize)>,
    pub analyses: Vec<TickerAnalysis>,
}

impl ReportPort for CollectingReport {
    fn write_backtest(&mut self, report: &BacktestReport<'_>) -> Result<(), SigtraderError> {
        self.backtests.push((
            report.config.ticker.clone(),
            report.metrics.final_equity,
            report.metrics.total_trades,
        ));
        Ok(())
    }

    fn write_analysis(&mut self, analysis: &TickerAnalysis) -> Result<(), SigtraderError> {
        self.analyses.push(analysis.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(offset: i64) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(offset)
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Daily bars from 2024-01-01 with every price equal to the close.
pub fn make_bars(closes: &[&str]) -> Vec<TradingDayPrice> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| TradingDayPrice::flat(day(i as i64), dec(close)))
        .collect()
}

pub fn crossing_bars() -> Vec<TradingDayPrice> {
    make_bars(&CROSSING_CLOSES)
}

pub fn crossover_strategy() -> Strategy {
    Strategy {
        name: "SMA crossover".into(),
        description: "Golden cross in, death cross out".into(),
        entry: parse_rule("MA_CROSS_ABOVE(2,3)").unwrap(),
        exit: parse_rule("MA_CROSS_BELOW(2,3)").unwrap(),
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        ticker: "ABC".into(),
        start_date: day(0),
        end_date: day(20),
        initial_funds: dec("1000"),
        fee_flat: dec("1"),
        fee_percent: Decimal::ZERO,
        interest_rate: Decimal::ZERO,
    }
}
