//! Daily price bar representation.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

/// One trading day's OHLC bar in fixed-point decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingDayPrice {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl TradingDayPrice {
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// A bar where every price is the closing price.
    pub fn flat(date: NaiveDate, close: Decimal) -> Self {
        Self::new(date, close, close, close, close)
    }
}

/// Sort bars ascending by date and drop repeated dates (first occurrence wins).
///
/// Upstream sources do not guarantee order, so every series is passed through
/// here before an indicator sees it.
pub fn sort_by_date(mut prices: Vec<TradingDayPrice>) -> Vec<TradingDayPrice> {
    prices.sort_by_key(|p| p.date);
    let before = prices.len();
    prices.dedup_by_key(|p| p.date);
    if prices.len() != before {
        warn!(
            "dropped {} bar(s) with duplicate dates",
            before - prices.len()
        );
    }
    prices
}

/// Closing prices as a nullable series ready for the calculators.
pub fn closing_prices(prices: &[TradingDayPrice]) -> Vec<Option<Decimal>> {
    prices.iter().map(|p| Some(p.close)).collect()
}

/// The trailing slice of `prices` ending on or before `latest`, at most `count` bars long.
pub fn trailing_window(
    prices: &[TradingDayPrice],
    latest: NaiveDate,
    count: usize,
) -> &[TradingDayPrice] {
    let end = prices.partition_point(|p| p.date <= latest);
    let start = end.saturating_sub(count);
    &prices[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn flat_bar_uses_close_everywhere() {
        let bar = TradingDayPrice::flat(date(2), dec!(15.55));
        assert_eq!(bar.open, dec!(15.55));
        assert_eq!(bar.high, dec!(15.55));
        assert_eq!(bar.low, dec!(15.55));
        assert_eq!(bar.close, dec!(15.55));
    }

    #[test]
    fn sort_orders_ascending() {
        let prices = vec![
            TradingDayPrice::flat(date(5), dec!(3)),
            TradingDayPrice::flat(date(2), dec!(1)),
            TradingDayPrice::flat(date(3), dec!(2)),
        ];
        let sorted = sort_by_date(prices);
        let dates: Vec<_> = sorted.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2), date(3), date(5)]);
    }

    #[test]
    fn sort_drops_duplicate_dates() {
        let prices = vec![
            TradingDayPrice::flat(date(2), dec!(1)),
            TradingDayPrice::flat(date(3), dec!(2)),
            TradingDayPrice::flat(date(2), dec!(9)),
        ];
        let sorted = sort_by_date(prices);
        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].close, dec!(1));
    }

    #[test]
    fn closing_prices_are_all_present() {
        let prices = vec![
            TradingDayPrice::flat(date(2), dec!(1.5)),
            TradingDayPrice::flat(date(3), dec!(2.5)),
        ];
        assert_eq!(
            closing_prices(&prices),
            vec![Some(dec!(1.5)), Some(dec!(2.5))]
        );
    }

    #[test]
    fn trailing_window_ends_at_latest() {
        let prices: Vec<_> = (1..=10)
            .map(|d| TradingDayPrice::flat(date(d), Decimal::from(d)))
            .collect();
        let window = trailing_window(&prices, date(7), 3);
        let dates: Vec<_> = window.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(5), date(6), date(7)]);
    }

    #[test]
    fn trailing_window_shorter_than_requested() {
        let prices: Vec<_> = (1..=4)
            .map(|d| TradingDayPrice::flat(date(d), Decimal::from(d)))
            .collect();
        assert_eq!(trailing_window(&prices, date(3), 10).len(), 3);
        assert!(trailing_window(&prices, date(1) - chrono::Duration::days(1), 5).is_empty());
    }
}
