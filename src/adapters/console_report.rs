//! Plain-text report adapter.
//!
//! Writes backtest summaries and live analysis results to any `Write`
//! sink, stdout by default.

use std::io::{self, Write};

use crate::domain::analysis::TickerAnalysis;
use crate::domain::error::SigtraderError;
use crate::domain::filter::SignalOrder;
use crate::domain::portfolio::to_cents;
use crate::ports::report_port::{BacktestReport, ReportPort};

pub struct ConsoleReport<W: Write> {
    out: W,
    order: SignalOrder,
}

impl ConsoleReport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            order: SignalOrder::default(),
        }
    }

    /// Order in which buy signals are listed.
    pub fn with_order(mut self, order: SignalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn backtest_lines(&mut self, report: &BacktestReport<'_>) -> io::Result<()> {
        let m = report.metrics;
        let out = &mut self.out;

        writeln!(out, "=== {} ===", report.strategy.name)?;
        if !report.strategy.description.is_empty() {
            writeln!(out, "{}", report.strategy.description)?;
        }
        writeln!(out, "Entry:            {}", report.strategy.entry)?;
        writeln!(out, "Exit:             {}", report.strategy.exit)?;
        writeln!(
            out,
            "Ticker:           {} ({} to {})",
            report.config.ticker, report.config.start_date, report.config.end_date
        )?;
        writeln!(
            out,
            "Trading Days:     {} ({} skipped for lead-in)",
            report.run.trading_days, report.run.skipped_days
        )?;
        writeln!(out)?;
        writeln!(out, "Initial Funds:    {}", to_cents(report.config.initial_funds))?;
        writeln!(out, "Final Equity:     {}", to_cents(m.final_equity))?;
        writeln!(out, "Total Return:     {:.2}%", m.total_return * 100.0)?;
        writeln!(out, "Annualized:       {:.2}%", m.annualized_return * 100.0)?;
        writeln!(out, "Sharpe Ratio:     {:.2}", m.sharpe_ratio)?;
        writeln!(out, "Sortino Ratio:    {:.2}", m.sortino_ratio)?;
        writeln!(out, "Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0)?;
        writeln!(out, "Total Trades:     {}", m.total_trades)?;
        writeln!(out, "Win Rate:         {:.1}%", m.win_rate * 100.0)?;
        writeln!(out, "Profit Factor:    {:.2}", m.profit_factor)?;
        writeln!(out, "Total Fees:       {}", to_cents(m.total_fees))?;
        writeln!(out, "Interest Earned:  {}", to_cents(m.interest_earned))?;

        if !report.portfolio.closed_trades.is_empty() {
            writeln!(out)?;
            writeln!(out, "=== Trades ===")?;
            for trade in &report.portfolio.closed_trades {
                writeln!(
                    out,
                    "  {} -> {}  {} x {} @ {} -> {}  net {}",
                    trade.entry_date,
                    trade.exit_date,
                    trade.quantity,
                    trade.ticker,
                    trade.entry_price,
                    trade.exit_price,
                    to_cents(trade.pnl)
                )?;
            }
        }
        if let Some(position) = &report.portfolio.position {
            writeln!(
                out,
                "Open position:    {} x {} since {} @ {}",
                position.quantity, position.ticker, position.entry_date, position.entry_price
            )?;
        }
        Ok(())
    }

    fn analysis_lines(&mut self, analysis: &TickerAnalysis) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(
            out,
            "{} (latest trading date {})",
            analysis.ticker, analysis.latest_trading_date
        )?;
        for signal in &analysis.signals {
            writeln!(
                out,
                "  {}  {}  {}",
                signal.date, signal.indicator, signal.direction
            )?;
        }
        if analysis.buy_signals.is_empty() {
            writeln!(out, "  no buy signals")?;
        }
        for buy in self.order.arrange(&analysis.buy_signals) {
            writeln!(out, "  BUY {}", buy.date)?;
        }
        Ok(())
    }
}

impl<W: Write> ReportPort for ConsoleReport<W> {
    fn write_backtest(&mut self, report: &BacktestReport<'_>) -> Result<(), SigtraderError> {
        self.backtest_lines(report)?;
        Ok(())
    }

    fn write_analysis(&mut self, analysis: &TickerAnalysis) -> Result<(), SigtraderError> {
        self.analysis_lines(analysis)?;
        Ok(())
    }
}
