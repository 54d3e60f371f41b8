//! Strategy: a named pair of entry and exit rules.

use std::collections::BTreeSet;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::filter::{BuySignal, SellSignal};
use crate::domain::price::TradingDayPrice;
use crate::domain::rule::Rule;
use crate::domain::rule_eval::analyse;
use crate::domain::signal::IndicatorId;

#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub entry: Rule,
    pub exit: Rule,
}

impl Strategy {
    /// Lead-in needed before both rules can be evaluated.
    pub fn required_trading_prices(&self) -> usize {
        self.entry
            .required_trading_prices()
            .max(self.exit.required_trading_prices())
    }

    pub fn buy_signals(
        &self,
        prices: &[TradingDayPrice],
        range: DateRange,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        Ok(analyse(&self.entry, prices, range)?
            .into_iter()
            .map(|date| BuySignal { date })
            .collect())
    }

    pub fn sell_signals(
        &self,
        prices: &[TradingDayPrice],
        range: DateRange,
    ) -> Result<BTreeSet<SellSignal>, SigtraderError> {
        Ok(analyse(&self.exit, prices, range)?
            .into_iter()
            .map(|date| SellSignal { date })
            .collect())
    }

    /// Generators referenced by either rule.
    pub fn indicators(&self) -> Vec<IndicatorId> {
        let mut ids = self.entry.indicators();
        for id in self.exit.indicators() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
