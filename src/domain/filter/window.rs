//! Date-window decorators around another filter.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::filter::{BuySignal, SignalFilter, SignalMap, MAX_WINDOW_DAYS};
use crate::domain::signal::IndicatorId;

/// Keeps only signals inside a fixed inclusive date range.
#[derive(Debug, Clone)]
pub struct FixedDateRangeFilter {
    inner: Arc<dyn SignalFilter>,
    range: DateRange,
}

impl FixedDateRangeFilter {
    pub fn new(inner: Arc<dyn SignalFilter>, range: DateRange) -> Self {
        Self { inner, range }
    }
}

impl SignalFilter for FixedDateRangeFilter {
    fn indicators(&self) -> Vec<IndicatorId> {
        self.inner.indicators()
    }

    fn lookback_days(&self) -> u32 {
        self.inner.lookback_days()
    }

    fn apply(
        &self,
        signals: &SignalMap,
        latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        let mut buys = self.inner.apply(signals, latest_trading_date)?;
        buys.retain(|s| self.range.contains(s.date));
        Ok(buys)
    }
}

/// Keeps only signals from the last `days` calendar days, counting the
/// latest trading date as the first.
#[derive(Debug, Clone)]
pub struct RollingWindowFilter {
    inner: Arc<dyn SignalFilter>,
    days: u32,
}

impl RollingWindowFilter {
    pub fn new(inner: Arc<dyn SignalFilter>, days: u32) -> Result<Self, SigtraderError> {
        if days == 0 {
            return Err(SigtraderError::invalid_configuration(
                "rolling window must cover at least one day",
            ));
        }
        if days > MAX_WINDOW_DAYS {
            return Err(SigtraderError::invalid_configuration(format!(
                "rolling window of {days} days exceeds the maximum of {MAX_WINDOW_DAYS}"
            )));
        }
        Ok(Self { inner, days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }
}

impl SignalFilter for RollingWindowFilter {
    fn indicators(&self) -> Vec<IndicatorId> {
        self.inner.indicators()
    }

    fn lookback_days(&self) -> u32 {
        self.inner.lookback_days()
    }

    fn apply(
        &self,
        signals: &SignalMap,
        latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        let window = DateRange::trailing(latest_trading_date, self.days)?;
        let mut buys = self.inner.apply(signals, latest_trading_date)?;
        buys.retain(|s| window.contains(s.date));
        Ok(buys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::test_support::*;
    use crate::domain::filter::{
        AnyIndicatorFilter, ConfirmationFilter, ConfirmationWindow, MatchPolicy,
    };

    fn any_rsi() -> Arc<dyn SignalFilter> {
        Arc::new(AnyIndicatorFilter::new(vec![rsi_id()]).unwrap())
    }

    fn map() -> SignalMap {
        let mut map = SignalMap::new();
        map.insert(
            rsi_id(),
            signals(
                &rsi_id(),
                &[
                    date(2024, 4, 1),
                    date(2024, 4, 5),
                    date(2024, 4, 8),
                    date(2024, 4, 10),
                ],
            ),
        );
        map
    }

    #[test]
    fn fixed_range_is_inclusive() {
        let range = DateRange::new(date(2024, 4, 5), date(2024, 4, 8)).unwrap();
        let filter = FixedDateRangeFilter::new(any_rsi(), range);
        let buys = filter.apply(&map(), date(2024, 4, 10)).unwrap();
        assert_eq!(buy_dates(&buys), vec![date(2024, 4, 5), date(2024, 4, 8)]);
    }

    #[test]
    fn rolling_window_counts_back_from_latest() {
        let filter = RollingWindowFilter::new(any_rsi(), 3).unwrap();
        let buys = filter.apply(&map(), date(2024, 4, 10)).unwrap();
        // 8th, 9th, 10th
        assert_eq!(buy_dates(&buys), vec![date(2024, 4, 8), date(2024, 4, 10)]);
    }

    #[test]
    fn rolling_window_of_one_day() {
        let filter = RollingWindowFilter::new(any_rsi(), 1).unwrap();
        let buys = filter.apply(&map(), date(2024, 4, 8)).unwrap();
        assert_eq!(buy_dates(&buys), vec![date(2024, 4, 8)]);
    }

    #[test]
    fn rolling_window_must_be_positive() {
        assert!(RollingWindowFilter::new(any_rsi(), 0).is_err());
    }

    #[test]
    fn rolling_window_is_capped() {
        assert!(RollingWindowFilter::new(any_rsi(), MAX_WINDOW_DAYS).is_ok());
        for days in [MAX_WINDOW_DAYS + 1, u32::MAX] {
            assert!(matches!(
                RollingWindowFilter::new(any_rsi(), days),
                Err(SigtraderError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn rolling_window_near_calendar_start_is_an_error() {
        let filter = RollingWindowFilter::new(any_rsi(), 5).unwrap();
        let mut map = SignalMap::new();
        map.insert(rsi_id(), Vec::new());
        assert!(filter.apply(&map, NaiveDate::MIN).is_err());
    }

    #[test]
    fn decorators_forward_inner_lookback() {
        let confirm: Arc<dyn SignalFilter> = Arc::new(ConfirmationFilter::new(
            macd_id(),
            rsi_id(),
            ConfirmationWindow::new(2, 3).unwrap(),
            MatchPolicy::Earliest,
        ));
        let rolling = RollingWindowFilter::new(Arc::clone(&confirm), 5).unwrap();
        assert_eq!(rolling.lookback_days(), 5);
        let range = DateRange::single(date(2024, 4, 8));
        assert_eq!(FixedDateRangeFilter::new(confirm, range).lookback_days(), 5);
        assert_eq!(RollingWindowFilter::new(any_rsi(), 5).unwrap().lookback_days(), 0);
    }

    #[test]
    fn decorators_expose_inner_indicators() {
        let filter = RollingWindowFilter::new(any_rsi(), 5).unwrap();
        assert_eq!(filter.indicators(), vec![rsi_id()]);
    }

    #[test]
    fn errors_from_inner_filter_propagate() {
        let filter = RollingWindowFilter::new(any_rsi(), 5).unwrap();
        assert!(filter.apply(&SignalMap::new(), date(2024, 4, 8)).is_err());
    }
}
