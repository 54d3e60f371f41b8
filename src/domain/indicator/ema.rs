//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are `None`.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    ema_values, require_lookback, require_prices, IndicatorCalculator, IndicatorOutput,
};
use crate::domain::price::{closing_prices, TradingDayPrice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialMovingAverage {
    lookback: usize,
}

impl ExponentialMovingAverage {
    pub fn new(lookback: usize) -> Result<Self, SigtraderError> {
        require_lookback("EMA", lookback)?;
        Ok(Self { lookback })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl IndicatorCalculator for ExponentialMovingAverage {
    type Output = IndicatorOutput;

    fn name(&self) -> String {
        format!("EMA({})", self.lookback)
    }

    fn minimum_prices(&self) -> usize {
        self.lookback
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<IndicatorOutput, SigtraderError> {
        require_prices(&self.name(), prices.len(), self.minimum_prices())?;
        ema_values(&closing_prices(prices), self.lookback, &self.name())
    }
}
