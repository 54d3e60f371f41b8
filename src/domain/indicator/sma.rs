//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are `None`.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_lookback, require_prices, sma_values, IndicatorCalculator, IndicatorOutput,
};
use crate::domain::price::{closing_prices, TradingDayPrice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleMovingAverage {
    lookback: usize,
}

impl SimpleMovingAverage {
    pub fn new(lookback: usize) -> Result<Self, SigtraderError> {
        require_lookback("SMA", lookback)?;
        Ok(Self { lookback })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl IndicatorCalculator for SimpleMovingAverage {
    type Output = IndicatorOutput;

    fn name(&self) -> String {
        format!("SMA({})", self.lookback)
    }

    fn minimum_prices(&self) -> usize {
        self.lookback
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<IndicatorOutput, SigtraderError> {
        require_prices(&self.name(), prices.len(), self.minimum_prices())?;
        sma_values(&closing_prices(prices), self.lookback, &self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::{dec_str, make_prices};
    use rust_decimal_macros::dec;

    #[test]
    fn sma_warmup() {
        let prices = make_prices(&["10", "20", "30", "40", "50"]);
        let out = SimpleMovingAverage::new(3).unwrap().calculate(&prices).unwrap();

        assert_eq!(out.len(), 5);
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert_eq!(out[2], Some(dec!(20)));
        assert_eq!(out[3], Some(dec!(30)));
        assert_eq!(out[4], Some(dec!(40)));
    }

    #[test]
    fn sma_constant_series_has_no_drift() {
        let closes = vec!["15.37"; 200];
        let prices = make_prices(&closes);
        let out = SimpleMovingAverage::new(20).unwrap().calculate(&prices).unwrap();
        for value in out.iter().skip(19) {
            assert_eq!(*value, Some(dec!(15.37)));
        }
    }

    #[test]
    fn sma_lookback_one_is_identity() {
        let prices = make_prices(&["1.1", "2.2", "3.3"]);
        let out = SimpleMovingAverage::new(1).unwrap().calculate(&prices).unwrap();
        assert_eq!(
            out,
            vec![Some(dec_str("1.1")), Some(dec_str("2.2")), Some(dec_str("3.3"))]
        );
    }

    #[test]
    fn sma_insufficient_prices() {
        let prices = make_prices(&["1", "2"]);
        let err = SimpleMovingAverage::new(3).unwrap().calculate(&prices).unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::InsufficientData {
                required: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn sma_zero_lookback_rejected() {
        assert!(SimpleMovingAverage::new(0).is_err());
    }

    #[test]
    fn sma_name() {
        assert_eq!(SimpleMovingAverage::new(20).unwrap().name(), "SMA(20)");
    }
}
