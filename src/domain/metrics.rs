//! Performance metrics and statistics.
//!
//! Bookkeeping is exact decimal; ratios are reported as `f64`.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::portfolio::{EquityPoint, Portfolio};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: Decimal,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
    pub total_fees: Decimal,
    pub interest_earned: Decimal,
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let trades = &portfolio.closed_trades;
        let initial_capital = as_f64(portfolio.initial_capital);

        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(portfolio.initial_capital);

        let total_return = if initial_capital > 0.0 {
            (as_f64(final_equity) - initial_capital) / initial_capital
        } else {
            0.0
        };

        let trading_days = equity_curve.len() as f64;
        let years = trading_days / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in trades {
            let pnl = as_f64(trade.pnl);
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_duration_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_duration_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration,
            total_fees: portfolio.total_fees,
            interest_earned: portfolio.cash.interest_earned(),
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = as_f64(first.equity);
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut dd_start: Option<NaiveDate> = None;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        let equity = as_f64(point.equity);
        if equity > peak {
            peak = equity;
            dd_start = None;
            current_dd_duration = 0;
        } else if peak > 0.0 && equity < peak {
            let dd = (peak - equity) / peak;
            max_dd = max_dd.max(dd);
            if dd_start.is_none() {
                dd_start = Some(point.date);
            }
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = as_f64(w[0].equity);
            let curr = as_f64(w[1].equity);
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sum: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sum / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::FeeSchedule;
    use crate::domain::position::ClosedTrade;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn make_equity_curve(values: &[Decimal]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                equity: v,
            })
            .collect()
    }

    fn make_portfolio(equity: Vec<Decimal>, trades: Vec<ClosedTrade>) -> Portfolio {
        let initial = equity.first().copied().unwrap_or(dec!(100000));
        let mut portfolio = Portfolio::new(initial, Decimal::ZERO, FeeSchedule::default());
        portfolio.closed_trades = trades;
        portfolio.equity_curve = make_equity_curve(&equity);
        portfolio
    }

    fn make_trade(ticker: &str, pnl: Decimal, days: i64) -> ClosedTrade {
        let entry_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ClosedTrade {
            ticker: ticker.to_string(),
            quantity: 100,
            entry_price: dec!(100),
            exit_price: dec!(100) + pnl / dec!(100),
            entry_date,
            exit_date: entry_date + chrono::Duration::days(days),
            fees: Decimal::ZERO,
            pnl,
        }
    }

    #[test]
    fn metrics_empty_portfolio() {
        let portfolio = Portfolio::new(dec!(100000), Decimal::ZERO, FeeSchedule::default());
        let metrics = Metrics::compute(&portfolio, 0.05);
        assert_relative_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.final_equity, dec!(100000));
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.trades_won, 0);
        assert_eq!(metrics.trades_lost, 0);
    }

    #[test]
    fn metrics_total_return_positive() {
        let portfolio = make_portfolio(vec![dec!(100000), dec!(110000)], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.05);
        assert_relative_eq!(metrics.total_return, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn metrics_total_return_negative() {
        let portfolio = make_portfolio(vec![dec!(100000), dec!(90000)], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.05);
        assert_relative_eq!(metrics.total_return, -0.10, epsilon = 1e-9);
    }

    #[test]
    fn metrics_annualized_flat() {
        let portfolio = make_portfolio(vec![dec!(100000); 252], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.05);
        assert_relative_eq!(metrics.annualized_return, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn metrics_trade_stats_wins_and_losses() {
        let trades = vec![
            make_trade("A", dec!(100), 5),
            make_trade("B", dec!(-50), 3),
            make_trade("C", dec!(200), 10),
            make_trade("D", dec!(0), 1),
        ];
        let portfolio = make_portfolio(vec![dec!(100000), dec!(100250)], trades);
        let metrics = Metrics::compute(&portfolio, 0.0);

        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.trades_won, 2);
        assert_eq!(metrics.trades_lost, 1);
        assert_eq!(metrics.trades_breakeven, 1);
        assert_relative_eq!(metrics.win_rate, 0.5);
        assert_relative_eq!(metrics.profit_factor, 6.0);
        assert_relative_eq!(metrics.avg_win, 150.0);
        assert_relative_eq!(metrics.avg_loss, 50.0);
        assert_relative_eq!(metrics.largest_win, 200.0);
        assert_relative_eq!(metrics.largest_loss, 50.0);
        assert_relative_eq!(metrics.avg_trade_duration, 4.75);
    }

    #[test]
    fn metrics_profit_factor_without_losses() {
        let trades = vec![make_trade("A", dec!(100), 5)];
        let portfolio = make_portfolio(vec![dec!(100000)], trades);
        let metrics = Metrics::compute(&portfolio, 0.0);
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn metrics_max_drawdown() {
        let portfolio = make_portfolio(
            vec![dec!(100), dec!(120), dec!(90), dec!(100), dec!(130), dec!(117)],
            vec![],
        );
        let metrics = Metrics::compute(&portfolio, 0.0);
        assert_relative_eq!(metrics.max_drawdown, 0.25, epsilon = 1e-9);
        assert_eq!(metrics.max_drawdown_duration, 2);
    }

    #[test]
    fn metrics_sharpe_zero_for_constant_equity() {
        let portfolio = make_portfolio(vec![dec!(100); 10], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.0);
        assert_relative_eq!(metrics.sharpe_ratio, 0.0);
        assert_relative_eq!(metrics.sortino_ratio, 0.0);
    }

    #[test]
    fn metrics_sharpe_positive_for_rising_equity() {
        let portfolio = make_portfolio(
            vec![dec!(100), dec!(101), dec!(103), dec!(102), dec!(105), dec!(107)],
            vec![],
        );
        let metrics = Metrics::compute(&portfolio, 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sortino_ratio > 0.0);
    }

    #[test]
    fn metrics_carry_fees_and_interest() {
        let mut portfolio = make_portfolio(vec![dec!(1000)], vec![]);
        portfolio.total_fees = dec!(15.90);
        let metrics = Metrics::compute(&portfolio, 0.0);
        assert_eq!(metrics.total_fees, dec!(15.90));
        assert_eq!(metrics.interest_earned, Decimal::ZERO);
    }
}
