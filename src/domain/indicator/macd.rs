//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! The MACD line starts at index slow-1, the signal line at slow+signal-2.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    difference, ema_values, require_lookback, require_prices, IndicatorCalculator,
    IndicatorOutput,
};
use crate::domain::price::{closing_prices, TradingDayPrice};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// The three aligned MACD series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: IndicatorOutput,
    pub signal: IndicatorOutput,
    pub histogram: IndicatorOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageConvergenceDivergence {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl MovingAverageConvergenceDivergence {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, SigtraderError> {
        require_lookback("MACD fast", fast)?;
        require_lookback("MACD slow", slow)?;
        require_lookback("MACD signal", signal)?;
        if fast >= slow {
            return Err(SigtraderError::invalid_configuration(format!(
                "MACD fast period ({fast}) must be shorter than slow period ({slow})"
            )));
        }
        Ok(Self { fast, slow, signal })
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }

    pub fn signal(&self) -> usize {
        self.signal
    }
}

impl Default for MovingAverageConvergenceDivergence {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl IndicatorCalculator for MovingAverageConvergenceDivergence {
    type Output = MacdOutput;

    fn name(&self) -> String {
        format!("MACD({},{},{})", self.fast, self.slow, self.signal)
    }

    /// Sum of the three EMA minimums.
    fn minimum_prices(&self) -> usize {
        self.fast + self.slow + self.signal
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<MacdOutput, SigtraderError> {
        let name = self.name();
        require_prices(&name, prices.len(), self.minimum_prices())?;

        let closes = closing_prices(prices);
        let fast = ema_values(&closes, self.fast, &name)?;
        let slow = ema_values(&closes, self.slow, &name)?;
        let macd = difference(&fast, &slow);
        let signal = ema_values(&macd, self.signal, &name)?;
        let histogram = difference(&macd, &signal);

        Ok(MacdOutput {
            macd,
            signal,
            histogram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_prices;
    use crate::domain::indicator::ExponentialMovingAverage;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn rising(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}", 10 + i)).collect()
    }

    fn as_refs(values: &[String]) -> Vec<&str> {
        values.iter().map(String::as_str).collect()
    }

    #[test]
    fn macd_warmup_positions() {
        let closes = rising(20);
        let prices = make_prices(&as_refs(&closes));
        let out = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap();

        assert_eq!(out.macd.len(), 20);
        assert!(out.macd[..5].iter().all(Option::is_none));
        assert!(out.macd[5..].iter().all(Option::is_some));
        assert!(out.signal[..8].iter().all(Option::is_none));
        assert!(out.signal[8..].iter().all(Option::is_some));
        assert!(out.histogram[..8].iter().all(Option::is_none));
        assert!(out.histogram[8..].iter().all(Option::is_some));
    }

    #[test]
    fn macd_line_is_fast_minus_slow() {
        let closes = rising(20);
        let prices = make_prices(&as_refs(&closes));
        let out = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap();

        let fast = ExponentialMovingAverage::new(3).unwrap().calculate(&prices).unwrap();
        let slow = ExponentialMovingAverage::new(6).unwrap().calculate(&prices).unwrap();
        for i in 5..20 {
            assert_eq!(out.macd[i], Some(fast[i].unwrap() - slow[i].unwrap()));
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes = rising(25);
        let prices = make_prices(&as_refs(&closes));
        let out = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap();
        for i in 8..25 {
            assert_eq!(
                out.histogram[i],
                Some(out.macd[i].unwrap() - out.signal[i].unwrap())
            );
        }
    }

    #[test]
    fn macd_constant_prices_are_zero() {
        let prices = make_prices(&["50"; 30]);
        let out = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap();
        for value in out.macd.iter().flatten() {
            assert_eq!(value.round_dp(20), Decimal::ZERO);
        }
        for value in out.signal.iter().flatten() {
            assert_eq!(value.round_dp(20), Decimal::ZERO);
        }
    }

    #[test]
    fn macd_rising_trend_is_positive() {
        let closes = rising(30);
        let prices = make_prices(&as_refs(&closes));
        let out = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap();
        assert!(out.macd[29].unwrap() > dec!(0));
    }

    #[test]
    fn macd_minimum_is_sum_of_periods() {
        let macd = MovingAverageConvergenceDivergence::default();
        assert_eq!(macd.minimum_prices(), 47);
        assert_eq!(macd.name(), "MACD(12,26,9)");
    }

    #[test]
    fn macd_insufficient_prices() {
        let prices = make_prices(&["1"; 12]);
        let err = MovingAverageConvergenceDivergence::new(3, 6, 4)
            .unwrap()
            .calculate(&prices)
            .unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::InsufficientData {
                required: 13,
                available: 12,
                ..
            }
        ));
    }

    #[test]
    fn macd_fast_must_be_shorter_than_slow() {
        assert!(MovingAverageConvergenceDivergence::new(26, 12, 9).is_err());
        assert!(MovingAverageConvergenceDivergence::new(12, 12, 9).is_err());
        assert!(MovingAverageConvergenceDivergence::new(0, 12, 9).is_err());
        assert!(MovingAverageConvergenceDivergence::new(3, 12, 0).is_err());
    }
}
