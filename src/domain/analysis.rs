//! Live signal analysis.
//!
//! Runs the generators a filter refers to over the most recent history of a
//! ticker and reports the buy signals that fall inside a rolling window
//! ending on the latest trading date.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::filter::{BuySignal, RollingWindowFilter, SignalFilter, SignalMap};
use crate::domain::price::{sort_by_date, trailing_window, TradingDayPrice};
use crate::domain::signal::{IndicatorSignal, SignalGenerator};

/// Outcome of analysing one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerAnalysis {
    pub ticker: String,
    /// Last bar dated on or before the analysis date.
    pub latest_trading_date: NaiveDate,
    /// Every generator signal inside the rolling window, oldest first.
    pub signals: Vec<IndicatorSignal>,
    pub buy_signals: BTreeSet<BuySignal>,
}

#[derive(Debug)]
pub struct LiveAnalysis {
    filter: RollingWindowFilter,
    generators: Vec<Arc<dyn SignalGenerator>>,
    rolling_days: u32,
}

impl LiveAnalysis {
    pub fn new(filter: Arc<dyn SignalFilter>, rolling_days: u32) -> Result<Self, SigtraderError> {
        let generators = filter
            .indicators()
            .iter()
            .map(|id| id.build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            filter: RollingWindowFilter::new(filter, rolling_days)?,
            generators,
            rolling_days,
        })
    }

    /// Longest generator lead-in plus the rolling window plus the filter's
    /// own lookback.
    ///
    /// The lookback is in calendar days and is counted here as bars, which
    /// never undercounts since every trading day is a calendar day.
    pub fn required_trading_days(&self) -> usize {
        let lead_in = self
            .generators
            .iter()
            .map(|g| g.required_trading_days())
            .max()
            .unwrap_or(1);
        lead_in
            .saturating_add(self.rolling_days as usize)
            .saturating_add(self.filter.lookback_days() as usize)
    }

    pub fn rolling_days(&self) -> u32 {
        self.rolling_days
    }

    pub fn analyse(
        &self,
        ticker: &str,
        prices: Vec<TradingDayPrice>,
        as_of: NaiveDate,
    ) -> Result<TickerAnalysis, SigtraderError> {
        let prices = sort_by_date(prices);
        let window = trailing_window(&prices, as_of, self.required_trading_days());
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Err(SigtraderError::NoData {
                ticker: ticker.to_string(),
            });
        };
        let latest_trading_date = last.date;
        debug!(
            "{}: analysing {} bars from {} to {}",
            ticker,
            window.len(),
            first.date,
            latest_trading_date
        );

        // Generate over the whole window. Anchors dated before the rolling
        // window can still be confirmed inside it.
        let scan = DateRange::new(first.date, latest_trading_date)?;
        let mut map = SignalMap::new();
        for generator in &self.generators {
            map.insert(generator.id(), generator.generate(window, scan)?);
        }

        let buy_signals = self.filter.apply(&map, latest_trading_date)?;

        let recent = DateRange::trailing(latest_trading_date, self.rolling_days)?;
        let mut signals: Vec<IndicatorSignal> = map
            .into_values()
            .flatten()
            .filter(|s| recent.contains(s.date))
            .collect();
        signals.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.indicator.to_string().cmp(&b.indicator.to_string()))
        });

        Ok(TickerAnalysis {
            ticker: ticker.to_string(),
            latest_trading_date,
            signals,
            buy_signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::test_support::buy_dates;
    use crate::domain::rule_parser::parse_filter;
    use crate::domain::signal::test_support::{day, make_prices};
    use crate::domain::signal::SignalDirection;

    fn crossing_prices() -> Vec<TradingDayPrice> {
        make_prices(&["10", "9", "8", "7", "6", "9", "12", "5", "3"])
    }

    fn analysis(filter: &str, rolling_days: u32) -> LiveAnalysis {
        LiveAnalysis::new(parse_filter(filter).unwrap(), rolling_days).unwrap()
    }

    #[test]
    fn lead_in_adds_rolling_window() {
        let live = analysis("ANY(MA_CROSS_ABOVE(2,3), RSI_OVERSOLD(14,30))", 5);
        assert_eq!(live.required_trading_days(), 16 + 5);
        assert_eq!(live.rolling_days(), 5);
    }

    #[test]
    fn zero_rolling_days_rejected() {
        let filter = parse_filter("ANY(MA_CROSS_ABOVE(2,3))").unwrap();
        assert!(LiveAnalysis::new(filter, 0).is_err());
    }

    #[test]
    fn oversized_rolling_days_rejected() {
        let filter = parse_filter("ANY(MA_CROSS_ABOVE(2,3))").unwrap();
        let err = LiveAnalysis::new(filter, 4_000_000_000).unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidConfiguration { .. }));
    }

    const CONFIRM_GRADIENTS: &str =
        "CONFIRM(SMA_GRADIENT(2,POSITIVE), SMA_GRADIENT(2,NEGATIVE), 3, 0)";

    // Rises through day 12, flattens on day 13, falls on days 14 and 15.
    fn turning_prices() -> Vec<TradingDayPrice> {
        make_prices(&[
            "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "12", "11", "10",
        ])
    }

    #[test]
    fn lead_in_adds_confirmation_window() {
        let live = analysis(CONFIRM_GRADIENTS, 1);
        assert_eq!(live.required_trading_days(), 3 + 1 + 3);
    }

    #[test]
    fn confirmation_anchor_before_rolling_window_is_found() {
        let live = analysis(CONFIRM_GRADIENTS, 1);
        let result = live.analyse("ABC", turning_prices(), day(15)).unwrap();
        assert_eq!(buy_dates(&result.buy_signals), vec![day(15)]);
    }

    #[test]
    fn wider_rolling_window_keeps_earlier_confirmations() {
        let live = analysis(CONFIRM_GRADIENTS, 4);
        let result = live.analyse("ABC", turning_prices(), day(15)).unwrap();
        assert_eq!(buy_dates(&result.buy_signals), vec![day(14), day(15)]);
    }

    #[test]
    fn reports_buys_inside_rolling_window() {
        let live = analysis("ANY(MA_CROSS_ABOVE(2,3), MA_CROSS_BELOW(2,3))", 4);
        let result = live.analyse("ABC", crossing_prices(), day(8)).unwrap();

        assert_eq!(result.latest_trading_date, day(8));
        assert_eq!(buy_dates(&result.buy_signals), vec![day(5), day(7)]);
        let directions: Vec<_> = result.signals.iter().map(|s| s.direction).collect();
        assert_eq!(
            directions,
            vec![SignalDirection::Bullish, SignalDirection::Bearish]
        );
    }

    #[test]
    fn older_signals_fall_outside_window() {
        let live = analysis("ANY(MA_CROSS_ABOVE(2,3))", 3);
        let result = live.analyse("ABC", crossing_prices(), day(8)).unwrap();
        assert!(result.buy_signals.is_empty());
        assert!(result.signals.is_empty());
    }

    #[test]
    fn analysis_date_after_last_bar_uses_last_bar() {
        let live = analysis("ANY(MA_CROSS_BELOW(2,3))", 3);
        let result = live.analyse("ABC", crossing_prices(), day(20)).unwrap();
        assert_eq!(result.latest_trading_date, day(8));
        assert_eq!(buy_dates(&result.buy_signals), vec![day(7)]);
    }

    #[test]
    fn analysis_date_before_history_is_no_data() {
        let live = analysis("ANY(MA_CROSS_ABOVE(2,3))", 3);
        let before = day(0).pred_opt().unwrap();
        let err = live.analyse("ABC", crossing_prices(), before).unwrap_err();
        assert!(matches!(err, SigtraderError::NoData { .. }));
    }

    #[test]
    fn short_history_is_insufficient() {
        let live = analysis("ANY(MA_CROSS_ABOVE(2,3))", 3);
        let prices = make_prices(&["10", "9", "8"]);
        let err = live.analyse("ABC", prices, day(2)).unwrap_err();
        assert!(matches!(err, SigtraderError::InsufficientData { .. }));
    }
}
