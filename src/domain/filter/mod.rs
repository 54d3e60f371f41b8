//! Signal filters.
//!
//! A filter reads the signal buckets produced by generators, keyed by
//! `IndicatorId`, and combines them into a de-duplicated set of buy signals.
//! A bucket that is present but empty is valid and matches nothing; a bucket
//! that is missing is a `MissingSignalBucket` error naming the identity.

pub mod any;
pub mod confirmation;
pub mod same_day;
pub mod window;

pub use any::AnyIndicatorFilter;
pub use confirmation::{ConfirmationFilter, ConfirmationWindow, MatchPolicy, MAX_WINDOW_DAYS};
pub use same_day::SameDayFilter;
pub use window::{FixedDateRangeFilter, RollingWindowFilter};

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;
use crate::domain::signal::{IndicatorId, IndicatorSignal};

/// Signals gathered per generator.
pub type SignalMap = HashMap<IndicatorId, Vec<IndicatorSignal>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuySignal {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SellSignal {
    pub date: NaiveDate,
}

/// Presentation order for a signal set; the set itself is always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalOrder {
    #[default]
    Ascending,
    Descending,
}

impl SignalOrder {
    pub fn arrange<T: Copy + Ord>(&self, signals: &BTreeSet<T>) -> Vec<T> {
        match self {
            SignalOrder::Ascending => signals.iter().copied().collect(),
            SignalOrder::Descending => signals.iter().rev().copied().collect(),
        }
    }
}

pub trait SignalFilter: std::fmt::Debug + Send + Sync {
    /// Identities whose buckets `apply` reads.
    fn indicators(&self) -> Vec<IndicatorId>;

    /// Calendar days before a buy date whose signals can still produce it.
    fn lookback_days(&self) -> u32 {
        0
    }

    fn apply(
        &self,
        signals: &SignalMap,
        latest_trading_date: NaiveDate,
    ) -> Result<BTreeSet<BuySignal>, SigtraderError>;
}

pub(crate) fn bucket<'a>(
    signals: &'a SignalMap,
    id: &IndicatorId,
) -> Result<&'a [IndicatorSignal], SigtraderError> {
    signals
        .get(id)
        .map(Vec::as_slice)
        .ok_or_else(|| SigtraderError::MissingSignalBucket {
            indicator: id.to_string(),
        })
}

pub(crate) fn dates_of(signals: &[IndicatorSignal]) -> BTreeSet<NaiveDate> {
    signals.iter().map(|s| s.date).collect()
}

pub(crate) fn require_indicators(
    filter: &str,
    indicators: &[IndicatorId],
) -> Result<(), SigtraderError> {
    if indicators.is_empty() {
        return Err(SigtraderError::invalid_configuration(format!(
            "{filter} filter needs at least one indicator"
        )));
    }
    Ok(())
}
