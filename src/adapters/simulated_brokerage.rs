//! Simulated brokerage: executes decisions against an in-memory portfolio.
//!
//! Buys spend all available cash on whole shares at the day's close, sells
//! liquidate the whole holding at the close. Idle cash earns interest
//! between bars.

use log::{debug, info};

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SigtraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::price::TradingDayPrice;
use crate::ports::brokerage_port::BrokeragePort;

#[derive(Debug, Clone)]
pub struct SimulatedBrokerage {
    portfolio: Portfolio,
}

impl SimulatedBrokerage {
    pub fn new(portfolio: Portfolio) -> Self {
        Self { portfolio }
    }

    pub fn from_config(config: &BacktestConfig) -> Result<Self, SigtraderError> {
        Ok(Self::new(Portfolio::new(
            config.initial_funds,
            config.interest_rate,
            config.fee_schedule()?,
        )))
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }
}

impl BrokeragePort for SimulatedBrokerage {
    fn on_buy_signal(&mut self, ticker: &str, bar: &TradingDayPrice) -> Result<(), SigtraderError> {
        self.portfolio.cash.accrue_to(bar.date);
        let opened = self
            .portfolio
            .open_position(ticker, bar.date, bar.close)?
            .cloned();
        match opened {
            Some(position) => info!(
                "{}: bought {} {} at {} (fee {})",
                bar.date, position.quantity, ticker, position.entry_price, position.entry_fee
            ),
            None if self.portfolio.is_holding() => {
                debug!("{}: buy signal for {} while holding", bar.date, ticker)
            }
            None => debug!(
                "{}: cannot afford {} at {} with {}",
                bar.date,
                ticker,
                bar.close,
                self.portfolio.cash.balance()
            ),
        }
        Ok(())
    }

    fn on_sell_signal(
        &mut self,
        ticker: &str,
        bar: &TradingDayPrice,
    ) -> Result<(), SigtraderError> {
        self.portfolio.cash.accrue_to(bar.date);
        match self.portfolio.close_position(bar.date, bar.close) {
            Some(trade) => info!(
                "{}: sold {} {} at {} for a net {}",
                bar.date, trade.quantity, ticker, trade.exit_price, trade.pnl
            ),
            None => debug!("{}: sell signal for {} while flat", bar.date, ticker),
        }
        Ok(())
    }

    fn mark_to_market(&mut self, bar: &TradingDayPrice) {
        self.portfolio.cash.accrue_to(bar.date);
        self.portfolio.record_equity(bar.date, bar.close);
    }

    fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::FeeSchedule;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal) -> TradingDayPrice {
        TradingDayPrice::flat(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), close)
    }

    fn brokerage(funds: Decimal, rate: Decimal, flat_fee: Decimal) -> SimulatedBrokerage {
        SimulatedBrokerage::new(Portfolio::new(
            funds,
            rate,
            FeeSchedule::new(flat_fee, Decimal::ZERO).unwrap(),
        ))
    }

    #[test]
    fn buy_then_sell_round_trip() {
        let mut broker = brokerage(dec!(1010), Decimal::ZERO, dec!(10));
        broker.on_buy_signal("ABC", &bar(2, dec!(10))).unwrap();
        broker.mark_to_market(&bar(2, dec!(10)));
        broker.on_sell_signal("ABC", &bar(3, dec!(12))).unwrap();
        broker.mark_to_market(&bar(3, dec!(12)));

        let portfolio = broker.into_portfolio();
        assert_eq!(portfolio.closed_trades.len(), 1);
        assert_eq!(portfolio.closed_trades[0].pnl, dec!(180));
        assert_eq!(portfolio.cash.balance(), dec!(1190));
        assert_eq!(portfolio.equity_curve.len(), 2);
        assert_eq!(portfolio.equity_curve[0].equity, dec!(1000));
        assert_eq!(portfolio.equity_curve[1].equity, dec!(1190));
    }

    #[test]
    fn second_buy_while_holding_is_ignored() {
        let mut broker = brokerage(dec!(1000), Decimal::ZERO, Decimal::ZERO);
        broker.on_buy_signal("ABC", &bar(2, dec!(10))).unwrap();
        broker.on_buy_signal("ABC", &bar(3, dec!(5))).unwrap();
        let position = broker.portfolio().position.clone().unwrap();
        assert_eq!(position.quantity, 100);
        assert_eq!(position.entry_price, dec!(10));
    }

    #[test]
    fn sell_while_flat_is_ignored() {
        let mut broker = brokerage(dec!(1000), Decimal::ZERO, Decimal::ZERO);
        broker.on_sell_signal("ABC", &bar(2, dec!(10))).unwrap();
        assert!(broker.portfolio().closed_trades.is_empty());
        assert_eq!(broker.portfolio().cash.balance(), dec!(1000));
    }

    #[test]
    fn idle_cash_earns_interest_between_bars() {
        // 36500 * 0.05 / 365 = 5 per day
        let mut broker = brokerage(dec!(36500), dec!(0.05), Decimal::ZERO);
        broker.mark_to_market(&bar(1, dec!(10)));
        broker.mark_to_market(&bar(2, dec!(10)));
        broker.mark_to_market(&bar(5, dec!(10)));
        assert_eq!(broker.portfolio().cash.interest_earned(), dec!(20));
        assert_eq!(broker.portfolio().equity_curve[2].equity, dec!(36520));
    }

    #[test]
    fn from_config_uses_fee_schedule() {
        let config = BacktestConfig {
            ticker: "ABC".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            initial_funds: dec!(5000),
            fee_flat: dec!(7.95),
            fee_percent: dec!(0.1),
            interest_rate: dec!(0.01),
        };
        let broker = SimulatedBrokerage::from_config(&config).unwrap();
        assert_eq!(broker.portfolio().fees.flat, dec!(7.95));
        assert_eq!(broker.portfolio().cash.balance(), dec!(5000));

        let negative = BacktestConfig {
            fee_flat: dec!(-1),
            ..config
        };
        assert!(SimulatedBrokerage::from_config(&negative).is_err());
    }
}
