//! Report generation port trait.

use crate::domain::analysis::TickerAnalysis;
use crate::domain::backtest::{BacktestConfig, BacktestRun};
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::strategy::Strategy;

/// Everything a report needs about one finished backtest.
#[derive(Debug, Clone, Copy)]
pub struct BacktestReport<'a> {
    pub strategy: &'a Strategy,
    pub config: &'a BacktestConfig,
    pub run: &'a BacktestRun,
    pub portfolio: &'a Portfolio,
    pub metrics: &'a Metrics,
}

pub trait ReportPort {
    fn write_backtest(&mut self, report: &BacktestReport<'_>) -> Result<(), SigtraderError>;

    fn write_analysis(&mut self, analysis: &TickerAnalysis) -> Result<(), SigtraderError>;
}
