//! Signal generators.
//!
//! A generator wraps one indicator calculator and reports the dates, inside an
//! inclusive range, on which its configured event occurs. Generators are
//! single-purpose: a bullish MACD crossover generator never reports bearish
//! crossovers, which keeps every signal bucket keyed by one `IndicatorId`.

pub mod gradient;
pub mod ma_crossover;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use gradient::{GradientType, MovingAverageGradient, MovingAverageKind};
pub use ma_crossover::MovingAverageCrossover;
pub use macd::{MacdCrossover, MacdReference};
pub use rsi::RsiThreshold;
pub use stochastic::StochasticCrossover;

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::date_range::DateRange;
use crate::domain::error::SigtraderError;
use crate::domain::price::TradingDayPrice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalDirection {
    Bullish,
    Bearish,
    Flat,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalDirection::Bullish => "bullish",
            SignalDirection::Bearish => "bearish",
            SignalDirection::Flat => "flat",
        };
        f.write_str(label)
    }
}

/// Identity of a configured generator: family, parameters and trigger.
///
/// Displays as the configuration text that builds it, e.g. `RSI_OVERSOLD(14,30)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorId {
    SmaGradient {
        lookback: usize,
        gradient: GradientType,
    },
    EmaGradient {
        lookback: usize,
        gradient: GradientType,
    },
    MaCrossAbove {
        fast: usize,
        slow: usize,
    },
    MaCrossBelow {
        fast: usize,
        slow: usize,
    },
    MacdBullish {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdBearish {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdZeroBullish {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdZeroBearish {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    RsiOversold {
        lookback: usize,
        threshold: Decimal,
    },
    RsiOverbought {
        lookback: usize,
        threshold: Decimal,
    },
    StochasticOversold {
        k: usize,
        d: usize,
        threshold: Decimal,
    },
    StochasticOverbought {
        k: usize,
        d: usize,
        threshold: Decimal,
    },
}

impl IndicatorId {
    /// Construct the generator this identity describes, validating its parameters.
    pub fn build(&self) -> Result<Arc<dyn SignalGenerator>, SigtraderError> {
        let generator: Arc<dyn SignalGenerator> = match *self {
            IndicatorId::SmaGradient { lookback, gradient } => Arc::new(
                MovingAverageGradient::new(MovingAverageKind::Simple, lookback, gradient)?,
            ),
            IndicatorId::EmaGradient { lookback, gradient } => Arc::new(
                MovingAverageGradient::new(MovingAverageKind::Exponential, lookback, gradient)?,
            ),
            IndicatorId::MaCrossAbove { fast, slow } => Arc::new(MovingAverageCrossover::new(
                fast,
                slow,
                SignalDirection::Bullish,
            )?),
            IndicatorId::MaCrossBelow { fast, slow } => Arc::new(MovingAverageCrossover::new(
                fast,
                slow,
                SignalDirection::Bearish,
            )?),
            IndicatorId::MacdBullish { fast, slow, signal } => Arc::new(MacdCrossover::new(
                fast,
                slow,
                signal,
                MacdReference::SignalLine,
                SignalDirection::Bullish,
            )?),
            IndicatorId::MacdBearish { fast, slow, signal } => Arc::new(MacdCrossover::new(
                fast,
                slow,
                signal,
                MacdReference::SignalLine,
                SignalDirection::Bearish,
            )?),
            IndicatorId::MacdZeroBullish { fast, slow, signal } => Arc::new(MacdCrossover::new(
                fast,
                slow,
                signal,
                MacdReference::ZeroLine,
                SignalDirection::Bullish,
            )?),
            IndicatorId::MacdZeroBearish { fast, slow, signal } => Arc::new(MacdCrossover::new(
                fast,
                slow,
                signal,
                MacdReference::ZeroLine,
                SignalDirection::Bearish,
            )?),
            IndicatorId::RsiOversold {
                lookback,
                threshold,
            } => Arc::new(RsiThreshold::new(
                lookback,
                threshold,
                SignalDirection::Bullish,
            )?),
            IndicatorId::RsiOverbought {
                lookback,
                threshold,
            } => Arc::new(RsiThreshold::new(
                lookback,
                threshold,
                SignalDirection::Bearish,
            )?),
            IndicatorId::StochasticOversold { k, d, threshold } => Arc::new(
                StochasticCrossover::new(k, d, threshold, SignalDirection::Bullish)?,
            ),
            IndicatorId::StochasticOverbought { k, d, threshold } => Arc::new(
                StochasticCrossover::new(k, d, threshold, SignalDirection::Bearish)?,
            ),
        };
        Ok(generator)
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorId::SmaGradient { lookback, gradient } => {
                write!(f, "SMA_GRADIENT({lookback},{gradient})")
            }
            IndicatorId::EmaGradient { lookback, gradient } => {
                write!(f, "EMA_GRADIENT({lookback},{gradient})")
            }
            IndicatorId::MaCrossAbove { fast, slow } => write!(f, "MA_CROSS_ABOVE({fast},{slow})"),
            IndicatorId::MaCrossBelow { fast, slow } => write!(f, "MA_CROSS_BELOW({fast},{slow})"),
            IndicatorId::MacdBullish { fast, slow, signal } => {
                write!(f, "MACD_BULLISH({fast},{slow},{signal})")
            }
            IndicatorId::MacdBearish { fast, slow, signal } => {
                write!(f, "MACD_BEARISH({fast},{slow},{signal})")
            }
            IndicatorId::MacdZeroBullish { fast, slow, signal } => {
                write!(f, "MACD_ZERO_BULLISH({fast},{slow},{signal})")
            }
            IndicatorId::MacdZeroBearish { fast, slow, signal } => {
                write!(f, "MACD_ZERO_BEARISH({fast},{slow},{signal})")
            }
            IndicatorId::RsiOversold {
                lookback,
                threshold,
            } => write!(f, "RSI_OVERSOLD({lookback},{threshold})"),
            IndicatorId::RsiOverbought {
                lookback,
                threshold,
            } => write!(f, "RSI_OVERBOUGHT({lookback},{threshold})"),
            IndicatorId::StochasticOversold { k, d, threshold } => {
                write!(f, "STOCHASTIC_OVERSOLD({k},{d},{threshold})")
            }
            IndicatorId::StochasticOverbought { k, d, threshold } => {
                write!(f, "STOCHASTIC_OVERBOUGHT({k},{d},{threshold})")
            }
        }
    }
}

/// One dated event reported by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorSignal {
    pub date: NaiveDate,
    pub indicator: IndicatorId,
    pub direction: SignalDirection,
}

pub trait SignalGenerator: fmt::Debug + Send + Sync {
    fn id(&self) -> IndicatorId;

    /// Fewest trading days `generate` accepts: the calculator's minimum plus
    /// whatever the generator needs for its day-over-day comparison.
    fn required_trading_days(&self) -> usize;

    /// Signals dated inside `range`, in ascending date order.
    ///
    /// Fails with `InsufficientData` when `prices` is shorter than
    /// `required_trading_days`; a range with no qualifying days is not an error.
    fn generate(
        &self,
        prices: &[TradingDayPrice],
        range: DateRange,
    ) -> Result<Vec<IndicatorSignal>, SigtraderError>;
}

pub(crate) fn require_trading_days(
    id: &IndicatorId,
    available: usize,
    required: usize,
) -> Result<(), SigtraderError> {
    if available < required {
        return Err(SigtraderError::InsufficientData {
            indicator: id.to_string(),
            required,
            available,
        });
    }
    Ok(())
}

/// Visit every day after the first whose date lies in `range`, emitting a
/// signal when `fires(index)` holds for that day.
pub(crate) fn scan_days<F>(
    prices: &[TradingDayPrice],
    range: DateRange,
    id: &IndicatorId,
    direction: SignalDirection,
    fires: F,
) -> Vec<IndicatorSignal>
where
    F: Fn(usize) -> bool,
{
    (1..prices.len())
        .filter(|&i| range.contains(prices[i].date) && fires(i))
        .map(|i| IndicatorSignal {
            date: prices[i].date,
            indicator: id.clone(),
            direction,
        })
        .collect()
}

/// The values for yesterday and today, when both are present.
pub(crate) fn pair_at(values: &[Option<Decimal>], today: usize) -> Option<(Decimal, Decimal)> {
    match (values.get(today.checked_sub(1)?), values.get(today)) {
        (Some(Some(yesterday)), Some(Some(today))) => Some((*yesterday, *today)),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn indicator_id_renders_configuration_text() {
        let id = IndicatorId::RsiOversold {
            lookback: 14,
            threshold: dec!(30),
        };
        assert_eq!(id.to_string(), "RSI_OVERSOLD(14,30)");

        let id = IndicatorId::SmaGradient {
            lookback: 20,
            gradient: GradientType::Positive,
        };
        assert_eq!(id.to_string(), "SMA_GRADIENT(20,POSITIVE)");

        let id = IndicatorId::MacdZeroBearish {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(id.to_string(), "MACD_ZERO_BEARISH(12,26,9)");
    }

    #[test]
    fn build_round_trips_identity() {
        let ids = vec![
            IndicatorId::EmaGradient {
                lookback: 5,
                gradient: GradientType::Negative,
            },
            IndicatorId::MaCrossAbove { fast: 5, slow: 20 },
            IndicatorId::MacdBearish {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            IndicatorId::RsiOverbought {
                lookback: 14,
                threshold: dec!(70),
            },
            IndicatorId::StochasticOversold {
                k: 14,
                d: 3,
                threshold: dec!(20),
            },
        ];
        for id in ids {
            assert_eq!(id.build().unwrap().id(), id);
        }
    }

    #[test]
    fn build_rejects_bad_parameters() {
        assert!(IndicatorId::MaCrossAbove { fast: 20, slow: 5 }.build().is_err());
        assert!(
            IndicatorId::RsiOversold {
                lookback: 14,
                threshold: dec!(120)
            }
            .build()
            .is_err()
        );
    }

    #[test]
    fn pair_at_needs_both_days() {
        let values = vec![None, Some(dec!(1)), Some(dec!(2))];
        assert_eq!(pair_at(&values, 0), None);
        assert_eq!(pair_at(&values, 1), None);
        assert_eq!(pair_at(&values, 2), Some((dec!(1), dec!(2))));
        assert_eq!(pair_at(&values, 3), None);
    }
}
