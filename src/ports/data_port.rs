//! Price history port trait.

use crate::domain::date_range::HistoryRange;
use crate::domain::error::SigtraderError;
use crate::domain::price::TradingDayPrice;

pub trait PriceHistoryPort {
    /// Daily bars for `ticker` dated in `range` (inclusive start, exclusive end).
    ///
    /// Order is not guaranteed; callers sort before use.
    fn fetch(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<Vec<TradingDayPrice>, SigtraderError>;
}
