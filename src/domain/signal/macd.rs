//! MACD crossover signals.
//!
//! Bullish when yesterday's MACD <= yesterday's reference, today's MACD >=
//! today's reference, and the MACD line is rising. The reference is either the
//! signal line or zero. Bearish mirrors every comparison.

use rust_decimal::Decimal;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorCalculator, MovingAverageConvergenceDivergence};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::{
    pair_at, require_trading_days, scan_days, IndicatorId, IndicatorSignal, SignalDirection,
    SignalGenerator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdReference {
    SignalLine,
    ZeroLine,
}

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    calculator: MovingAverageConvergenceDivergence,
    reference: MacdReference,
    direction: SignalDirection,
}

impl MacdCrossover {
    pub fn new(
        fast: usize,
        slow: usize,
        signal: usize,
        reference: MacdReference,
        direction: SignalDirection,
    ) -> Result<Self, SigtraderError> {
        if direction == SignalDirection::Flat {
            return Err(SigtraderError::invalid_configuration(
                "MACD crossover must be bullish or bearish",
            ));
        }
        Ok(Self {
            calculator: MovingAverageConvergenceDivergence::new(fast, slow, signal)?,
            reference,
            direction,
        })
    }
}

/// Crossover comparator shared by the signal-line and zero-line variants.
fn crossed(
    direction: SignalDirection,
    (macd_prev, macd_cur): (Decimal, Decimal),
    (ref_prev, ref_cur): (Decimal, Decimal),
) -> bool {
    match direction {
        SignalDirection::Bullish => {
            macd_prev <= ref_prev && macd_cur >= ref_cur && macd_cur > macd_prev
        }
        SignalDirection::Bearish => {
            macd_prev >= ref_prev && macd_cur <= ref_cur && macd_cur < macd_prev
        }
        SignalDirection::Flat => false,
    }
}

impl SignalGenerator for MacdCrossover {
    fn id(&self) -> IndicatorId {
        let fast = self.calculator.fast();
        let slow = self.calculator.slow();
        let signal = self.calculator.signal();
        match (self.reference, self.direction) {
            (MacdReference::SignalLine, SignalDirection::Bearish) => {
                IndicatorId::MacdBearish { fast, slow, signal }
            }
            (MacdReference::SignalLine, _) => IndicatorId::MacdBullish { fast, slow, signal },
            (MacdReference::ZeroLine, SignalDirection::Bearish) => {
                IndicatorId::MacdZeroBearish { fast, slow, signal }
            }
            (MacdReference::ZeroLine, _) => IndicatorId::MacdZeroBullish { fast, slow, signal },
        }
    }

    fn required_trading_days(&self) -> usize {
        self.calculator.minimum_prices() + 1
    }

    fn generate(
        &self,
        prices: &[TradingDayPrice],
        range: DateRange,
    ) -> Result<Vec<IndicatorSignal>, SigtraderError> {
        let id = self.id();
        require_trading_days(&id, prices.len(), self.required_trading_days())?;

        let output = self.calculator.calculate(prices)?;
        Ok(scan_days(prices, range, &id, self.direction, |i| {
            let Some(macd) = pair_at(&output.macd, i) else {
                return false;
            };
            let reference = match self.reference {
                MacdReference::SignalLine => match pair_at(&output.signal, i) {
                    Some(pair) => pair,
                    None => return false,
                },
                MacdReference::ZeroLine => (Decimal::ZERO, Decimal::ZERO),
            };
            crossed(self.direction, macd, reference)
        }))
    }
}
