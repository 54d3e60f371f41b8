//! Union of every signal date across the named indicators.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;
use crate::domain::filter::{bucket, require_indicators, BuySignal, SignalFilter, SignalMap};
use crate::domain::signal::IndicatorId;

#[derive(Debug, Clone)]
pub struct AnyIndicatorFilter {
    indicators: Vec<IndicatorId>,
}

impl AnyIndicatorFilter {
    pub fn new(indicators: Vec<IndicatorId>) -> Result<Self, SigtraderError> {
        require_indicators("ANY", &indicators)?;
        Ok(Self { indicators })
    }
}

impl SignalFilter for AnyIndicatorFilter {
    fn indicators(&self) -> Vec<IndicatorId> {
        self.indicators.clone()
    }

    fn apply(
        &self,
        signals: &SignalMap,
        _latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        let mut buys = BTreeSet::new();
        for id in &self.indicators {
            buys.extend(bucket(signals, id)?.iter().map(|s| BuySignal { date: s.date }));
        }
        Ok(buys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::test_support::*;

    #[test]
    fn union_of_all_buckets() {
        let mut map = SignalMap::new();
        map.insert(rsi_id(), signals(&rsi_id(), &[date(2024, 1, 2), date(2024, 1, 5)]));
        map.insert(macd_id(), signals(&macd_id(), &[date(2024, 1, 3)]));

        let filter = AnyIndicatorFilter::new(vec![rsi_id(), macd_id()]).unwrap();
        let buys = filter.apply(&map, date(2024, 1, 5)).unwrap();
        assert_eq!(
            buy_dates(&buys),
            vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 5)]
        );
    }

    #[test]
    fn duplicate_dates_collapse() {
        let mut map = SignalMap::new();
        let twice = [date(2024, 1, 2), date(2024, 1, 2)];
        map.insert(rsi_id(), signals(&rsi_id(), &twice));
        map.insert(macd_id(), signals(&macd_id(), &[date(2024, 1, 2)]));

        let filter = AnyIndicatorFilter::new(vec![rsi_id(), macd_id()]).unwrap();
        let buys = filter.apply(&map, date(2024, 1, 2)).unwrap();
        assert_eq!(buys.len(), 1);
    }

    #[test]
    fn empty_buckets_give_nothing() {
        let mut map = SignalMap::new();
        map.insert(rsi_id(), Vec::new());
        let filter = AnyIndicatorFilter::new(vec![rsi_id()]).unwrap();
        assert!(filter.apply(&map, date(2024, 1, 2)).unwrap().is_empty());
    }

    #[test]
    fn missing_bucket_fails() {
        let mut map = SignalMap::new();
        map.insert(rsi_id(), Vec::new());
        let filter = AnyIndicatorFilter::new(vec![rsi_id(), macd_id()]).unwrap();
        assert!(matches!(
            filter.apply(&map, date(2024, 1, 2)),
            Err(SigtraderError::MissingSignalBucket { .. })
        ));
    }

    #[test]
    fn needs_an_indicator() {
        assert!(AnyIndicatorFilter::new(Vec::new()).is_err());
    }
}
