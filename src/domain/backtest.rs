//! Backtest driver.
//!
//! Replays one ticker's history day by day. Each trading day inside the
//! configured range is judged on the trailing window of exactly the
//! strategy's lead-in length, and the resulting decisions are handed to a
//! `BrokeragePort`.
//!
//! A day on which both the entry and the exit rule fire is treated as an
//! exit: the sell goes to the brokerage and the buy is dropped.

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;

use crate::domain::date_range::{DateRange, HistoryRange};
use crate::domain::error::SigtraderError;
use crate::domain::portfolio::FeeSchedule;
use crate::domain::price::{sort_by_date, TradingDayPrice};
use crate::domain::strategy::Strategy;
use crate::ports::brokerage_port::BrokeragePort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub ticker: String,
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
    pub initial_funds: Decimal,
    pub fee_flat: Decimal,
    /// Percent of trade value.
    pub fee_percent: Decimal,
    /// Annual rate paid on idle cash.
    pub interest_rate: Decimal,
}

impl BacktestConfig {
    pub fn history_range(&self) -> Result<HistoryRange, SigtraderError> {
        HistoryRange::new(self.start_date, self.end_date)
    }

    pub fn fee_schedule(&self) -> Result<FeeSchedule, SigtraderError> {
        FeeSchedule::new(self.fee_flat, self.fee_percent)
    }
}

/// Counters describing one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktestRun {
    pub ticker: String,
    /// Bars dated inside the backtest range.
    pub trading_days: usize,
    /// Days in range that lacked enough earlier bars to evaluate the strategy.
    pub skipped_days: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    /// Buy decisions dropped because the exit rule fired the same day.
    pub suppressed_buys: usize,
}

pub fn run_backtest(
    strategy: &Strategy,
    ticker: &str,
    prices: Vec<TradingDayPrice>,
    range: HistoryRange,
    brokerage: &mut dyn BrokeragePort,
) -> Result<BacktestRun, SigtraderError> {
    let prices = sort_by_date(prices);
    let required = strategy.required_trading_prices().max(1);
    let mut run = BacktestRun {
        ticker: ticker.to_string(),
        ..BacktestRun::default()
    };

    info!(
        "backtesting {} with '{}' from {} to {} ({} bars of lead-in)",
        ticker, strategy.name, range.start, range.end, required
    );

    for (index, bar) in prices.iter().enumerate() {
        if !range.contains(bar.date) {
            continue;
        }
        run.trading_days += 1;

        if index + 1 < required {
            debug!(
                "{}: skipping {}, {} of {} bars available",
                ticker,
                bar.date,
                index + 1,
                required
            );
            run.skipped_days += 1;
            brokerage.mark_to_market(bar);
            continue;
        }

        let window = &prices[index + 1 - required..=index];
        let today = DateRange::single(bar.date);
        let sell = !strategy.sell_signals(window, today)?.is_empty();
        let buy = !strategy.buy_signals(window, today)?.is_empty();

        if sell {
            run.sell_signals += 1;
            brokerage.on_sell_signal(ticker, bar)?;
            if buy {
                debug!("{}: exit fired on {}, dropping buy", ticker, bar.date);
                run.suppressed_buys += 1;
            }
        } else if buy {
            run.buy_signals += 1;
            brokerage.on_buy_signal(ticker, bar)?;
        }

        brokerage.mark_to_market(bar);
    }

    if run.trading_days == 0 {
        return Err(SigtraderError::NoData {
            ticker: ticker.to_string(),
        });
    }
    if run.skipped_days > 0 {
        info!(
            "{}: skipped {} day(s) without enough lead-in",
            ticker, run.skipped_days
        );
    }
    info!(
        "{}: {} trading days, {} buy and {} sell signals",
        ticker, run.trading_days, run.buy_signals, run.sell_signals
    );

    Ok(run)
}
