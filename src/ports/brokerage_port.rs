//! Brokerage sink port trait.
//!
//! The backtest driver hands every buy and sell decision to a brokerage along
//! with the day's bar, and marks the account to market once per trading day.

use crate::domain::error::SigtraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::price::TradingDayPrice;

pub trait BrokeragePort {
    fn on_buy_signal(&mut self, ticker: &str, bar: &TradingDayPrice) -> Result<(), SigtraderError>;

    fn on_sell_signal(&mut self, ticker: &str, bar: &TradingDayPrice)
        -> Result<(), SigtraderError>;

    fn mark_to_market(&mut self, bar: &TradingDayPrice);

    fn portfolio(&self) -> &Portfolio;
}
