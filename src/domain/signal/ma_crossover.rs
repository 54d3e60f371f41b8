//! Moving average crossover signal: golden cross and death cross detection.
//!
//! Bullish when the fast SMA crosses above the slow SMA: yesterday fast <= slow,
//! today fast > slow. Bearish is the mirror image.

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorCalculator, SimpleMovingAverage};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::{
    pair_at, require_trading_days, scan_days, IndicatorId, IndicatorSignal, SignalDirection,
    SignalGenerator,
};

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    fast: SimpleMovingAverage,
    slow: SimpleMovingAverage,
    direction: SignalDirection,
}

impl MovingAverageCrossover {
    pub fn new(
        fast: usize,
        slow: usize,
        direction: SignalDirection,
    ) -> Result<Self, SigtraderError> {
        if fast >= slow {
            return Err(SigtraderError::invalid_configuration(format!(
                "moving average crossover fast period ({fast}) must be shorter than slow period ({slow})"
            )));
        }
        if direction == SignalDirection::Flat {
            return Err(SigtraderError::invalid_configuration(
                "moving average crossover must be bullish or bearish",
            ));
        }
        Ok(Self {
            fast: SimpleMovingAverage::new(fast)?,
            slow: SimpleMovingAverage::new(slow)?,
            direction,
        })
    }
}

impl SignalGenerator for MovingAverageCrossover {
    fn id(&self) -> IndicatorId {
        let fast = self.fast.lookback();
        let slow = self.slow.lookback();
        match self.direction {
            SignalDirection::Bearish => IndicatorId::MaCrossBelow { fast, slow },
            _ => IndicatorId::MaCrossAbove { fast, slow },
        }
    }

    fn required_trading_days(&self) -> usize {
        self.slow.minimum_prices() + 1
    }

    fn generate(
        &self,
        prices: &[TradingDayPrice],
        range: DateRange,
    ) -> Result<Vec<IndicatorSignal>, SigtraderError> {
        let id = self.id();
        require_trading_days(&id, prices.len(), self.required_trading_days())?;

        let fast = self.fast.calculate(prices)?;
        let slow = self.slow.calculate(prices)?;
        let bullish = self.direction == SignalDirection::Bullish;

        Ok(scan_days(prices, range, &id, self.direction, |i| {
            match (pair_at(&fast, i), pair_at(&slow, i)) {
                (Some((fast_prev, fast_cur)), Some((slow_prev, slow_cur))) => {
                    if bullish {
                        fast_prev <= slow_prev && fast_cur > slow_cur
                    } else {
                        fast_prev >= slow_prev && fast_cur < slow_cur
                    }
                }
                _ => false,
            }
        }))
    }
}
