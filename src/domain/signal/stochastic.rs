//! Stochastic oscillator crossover signals.
//!
//! Oversold: %K crosses above %D while %K is below the threshold (bullish).
//! Overbought: %K crosses below %D while %K is above the threshold (bearish).

use rust_decimal::Decimal;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorCalculator, StochasticOscillator};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::rsi::validate_percentage;
use crate::domain::signal::{
    pair_at, require_trading_days, scan_days, IndicatorId, IndicatorSignal, SignalDirection,
    SignalGenerator,
};

#[derive(Debug, Clone)]
pub struct StochasticCrossover {
    calculator: StochasticOscillator,
    threshold: Decimal,
    direction: SignalDirection,
}

impl StochasticCrossover {
    pub fn new(
        k_lookback: usize,
        d_lookback: usize,
        threshold: Decimal,
        direction: SignalDirection,
    ) -> Result<Self, SigtraderError> {
        validate_percentage("stochastic", threshold)?;
        if direction == SignalDirection::Flat {
            return Err(SigtraderError::invalid_configuration(
                "stochastic crossover must be oversold or overbought",
            ));
        }
        Ok(Self {
            calculator: StochasticOscillator::new(k_lookback, d_lookback)?,
            threshold,
            direction,
        })
    }
}

impl SignalGenerator for StochasticCrossover {
    fn id(&self) -> IndicatorId {
        let k = self.calculator.k_lookback();
        let d = self.calculator.d_lookback();
        let threshold = self.threshold;
        match self.direction {
            SignalDirection::Bearish => IndicatorId::StochasticOverbought { k, d, threshold },
            _ => IndicatorId::StochasticOversold { k, d, threshold },
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
        let threshold = self.threshold;
        let oversold = self.direction == SignalDirection::Bullish;

        Ok(scan_days(prices, range, &id, self.direction, |i| {
            match (pair_at(&output.k, i), pair_at(&output.d, i)) {
                (Some((k_prev, k_cur)), Some((d_prev, d_cur))) => {
                    if oversold {
                        k_prev <= d_prev && k_cur > d_cur && k_cur < threshold
                    } else {
                        k_prev >= d_prev && k_cur < d_cur && k_cur > threshold
                    }
                }
                _ => false,
            }
        }))
    }
}
