//! Dates on which every named indicator signalled.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;
use crate::domain::filter::{
    bucket, dates_of, require_indicators, BuySignal, SignalFilter, SignalMap,
};
use crate::domain::signal::IndicatorId;

#[derive(Debug, Clone)]
pub struct SameDayFilter {
    indicators: Vec<IndicatorId>,
}

impl SameDayFilter {
    pub fn new(indicators: Vec<IndicatorId>) -> Result<Self, SigtraderError> {
        require_indicators("SAME_DAY", &indicators)?;
        Ok(Self { indicators })
    }
}

impl SignalFilter for SameDayFilter {
    fn indicators(&self) -> Vec<IndicatorId> {
        self.indicators.clone()
    }

    fn apply(
        &self,
        signals: &SignalMap,
        _latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError> {
        // Resolve every bucket first so a missing one fails even when an
        // earlier bucket already emptied the intersection.
        let buckets = self
            .indicators
            .iter()
            .map(|id| bucket(signals, id).map(dates_of))
            .collect::<Result<Vec<_>, _>>()?;

        let mut iter = buckets.into_iter();
        let mut common = iter.next().unwrap_or_default();
        for dates in iter {
            common.retain(|d| dates.contains(d));
        }
        Ok(common.into_iter().map(|date| BuySignal { date }).collect())
    }
}
