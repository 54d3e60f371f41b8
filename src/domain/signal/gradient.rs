//! Moving-average gradient signals.
//!
//! Classifies the day-over-day change of an SMA or EMA as positive, flat or
//! negative and reports the days matching the configured classification.

use std::cmp::Ordering;
use std::fmt;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    ExponentialMovingAverage, IndicatorCalculator, IndicatorOutput, SimpleMovingAverage,
};
use crate::domain::price::TradingDayPrice;
use crate::domain::signal::{
    pair_at, require_trading_days, scan_days, IndicatorId, IndicatorSignal, SignalDirection,
    SignalGenerator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientType {
    Positive,
    Flat,
    Negative,
}

impl GradientType {
    pub fn classify(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => GradientType::Positive,
            Ordering::Equal => GradientType::Flat,
            Ordering::Less => GradientType::Negative,
        }
    }

    pub fn direction(&self) -> SignalDirection {
        match self {
            GradientType::Positive => SignalDirection::Bullish,
            GradientType::Flat => SignalDirection::Flat,
            GradientType::Negative => SignalDirection::Bearish,
        }
    }
}

impl fmt::Display for GradientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GradientType::Positive => "POSITIVE",
            GradientType::Flat => "FLAT",
            GradientType::Negative => "NEGATIVE",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingAverageKind {
    Simple,
    Exponential,
}

#[derive(Debug, Clone)]
pub struct MovingAverageGradient {
    kind: MovingAverageKind,
    lookback: usize,
    gradient: GradientType,
    calculator: AverageCalculator,
}

#[derive(Debug, Clone)]
enum AverageCalculator {
    Simple(SimpleMovingAverage),
    Exponential(ExponentialMovingAverage),
}

impl AverageCalculator {
    fn minimum_prices(&self) -> usize {
        match self {
            AverageCalculator::Simple(sma) => sma.minimum_prices(),
            AverageCalculator::Exponential(ema) => ema.minimum_prices(),
        }
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<IndicatorOutput, SigtraderError> {
        match self {
            AverageCalculator::Simple(sma) => sma.calculate(prices),
            AverageCalculator::Exponential(ema) => ema.calculate(prices),
        }
    }
}

impl MovingAverageGradient {
    pub fn new(
        kind: MovingAverageKind,
        lookback: usize,
        gradient: GradientType,
    ) -> Result<Self, SigtraderError> {
        let calculator = match kind {
            MovingAverageKind::Simple => {
                AverageCalculator::Simple(SimpleMovingAverage::new(lookback)?)
            }
            MovingAverageKind::Exponential => {
                AverageCalculator::Exponential(ExponentialMovingAverage::new(lookback)?)
            }
        };
        Ok(Self {
            kind,
            lookback,
            gradient,
            calculator,
        })
    }

    pub fn gradient(&self) -> GradientType {
        self.gradient
    }
}

impl SignalGenerator for MovingAverageGradient {
    fn id(&self) -> IndicatorId {
        match self.kind {
            MovingAverageKind::Simple => IndicatorId::SmaGradient {
                lookback: self.lookback,
                gradient: self.gradient,
            },
            MovingAverageKind::Exponential => IndicatorId::EmaGradient {
                lookback: self.lookback,
                gradient: self.gradient,
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

        let averages = self.calculator.calculate(prices)?;
        Ok(scan_days(
            prices,
            range,
            &id,
            self.gradient.direction(),
            |i| {
                pair_at(&averages, i).is_some_and(|(yesterday, today)| {
                    GradientType::classify(today.cmp(&yesterday)) == self.gradient
                })
            },
        ))
    }
}
