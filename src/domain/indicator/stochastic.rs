//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k))
//! %D = SMA(d) of %K
//!
//! A flat high/low window yields %K = 50.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_lookback, require_prices, sma_values, IndicatorCalculator, IndicatorOutput,
};
use crate::domain::price::TradingDayPrice;

const FLAT_RANGE_VALUE: Decimal = dec!(50);

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticOutput {
    pub k: IndicatorOutput,
    pub d: IndicatorOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticOscillator {
    k_lookback: usize,
    d_lookback: usize,
}

impl StochasticOscillator {
    pub fn new(k_lookback: usize, d_lookback: usize) -> Result<Self, SigtraderError> {
        require_lookback("Stochastic %K", k_lookback)?;
        require_lookback("Stochastic %D", d_lookback)?;
        Ok(Self {
            k_lookback,
            d_lookback,
        })
    }

    pub fn k_lookback(&self) -> usize {
        self.k_lookback
    }

    pub fn d_lookback(&self) -> usize {
        self.d_lookback
    }

    fn percent_k(&self, prices: &[TradingDayPrice]) -> IndicatorOutput {
        let mut output = vec![None; prices.len()];
        for (i, window) in prices.windows(self.k_lookback).enumerate() {
            let highest = window.iter().map(|p| p.high).max().unwrap_or_default();
            let lowest = window.iter().map(|p| p.low).min().unwrap_or_default();
            let close = window[window.len() - 1].close;
            let range = highest - lowest;

            let value = if range.is_zero() {
                FLAT_RANGE_VALUE
            } else {
                dec!(100) * (close - lowest) / range
            };
            output[i + self.k_lookback - 1] = Some(value);
        }
        output
    }
}

impl IndicatorCalculator for StochasticOscillator {
    type Output = StochasticOutput;

    fn name(&self) -> String {
        format!("STOCHASTIC({},{})", self.k_lookback, self.d_lookback)
    }

    fn minimum_prices(&self) -> usize {
        self.k_lookback + self.d_lookback - 1
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<StochasticOutput, SigtraderError> {
        let name = self.name();
        require_prices(&name, prices.len(), self.minimum_prices())?;

        let k = self.percent_k(prices);
        let d = sma_values(&k, self.d_lookback, &name)?;
        Ok(StochasticOutput { k, d })
    }
}
