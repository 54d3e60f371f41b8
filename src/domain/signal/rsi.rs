//! RSI threshold signals.
//!
//! Oversold: RSI falls through the threshold (yesterday >= t, today < t), a
//! bullish reversal signal. Overbought: RSI rises through the threshold
//! (yesterday <= t, today > t), bearish.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorCalculator, RelativeStrengthIndex};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::{
    pair_at, require_trading_days, scan_days, IndicatorId, IndicatorSignal, SignalDirection,
    SignalGenerator,
};

#[derive(Debug, Clone)]
pub struct RsiThreshold {
    calculator: RelativeStrengthIndex,
    threshold: Decimal,
    direction: SignalDirection,
}

pub(crate) fn validate_percentage(name: &str, threshold: Decimal) -> Result<(), SigtraderError> {
    if threshold < Decimal::ZERO || threshold > dec!(100) {
        return Err(SigtraderError::invalid_configuration(format!(
            "{name} threshold {threshold} must be between 0 and 100"
        )));
    }
    Ok(())
}

impl RsiThreshold {
    pub fn new(
        lookback: usize,
        threshold: Decimal,
        direction: SignalDirection,
    ) -> Result<Self, SigtraderError> {
        validate_percentage("RSI", threshold)?;
        if direction == SignalDirection::Flat {
            return Err(SigtraderError::invalid_configuration(
                "RSI threshold signal must be oversold or overbought",
            ));
        }
        Ok(Self {
            calculator: RelativeStrengthIndex::new(lookback)?,
            threshold,
            direction,
        })
    }
}

impl SignalGenerator for RsiThreshold {
    fn id(&self) -> IndicatorId {
        let lookback = self.calculator.lookback();
        let threshold = self.threshold;
        match self.direction {
            SignalDirection::Bearish => IndicatorId::RsiOverbought {
                lookback,
                threshold,
            },
            _ => IndicatorId::RsiOversold {
                lookback,
                threshold,
            },
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

        let rsi = self.calculator.calculate(prices)?;
        let threshold = self.threshold;
        let oversold = self.direction == SignalDirection::Bullish;

        Ok(scan_days(prices, range, &id, self.direction, |i| {
            pair_at(&rsi, i).is_some_and(|(yesterday, today)| {
                if oversold {
                    yesterday >= threshold && today < threshold
                } else {
                    yesterday <= threshold && today > threshold
                }
            })
        }))
    }
}
