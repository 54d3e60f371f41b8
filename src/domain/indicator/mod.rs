//! Technical indicator calculators.
//!
//! Every calculator turns a price series into output aligned one-to-one with
//! its input: `output.len() == prices.len()`, with `None` wherever there is
//! not yet enough history. Chained calculations (the MACD signal line, the
//! stochastic %D) run over a nullable series and use the same rule for
//! sufficiency: leading and trailing `None` entries are skipped, and the
//! remaining run must be unbroken and at least as long as the lookback.
//!
//! For single-series calculators the first value lands at index
//! `minimum_prices() - 1`. MACD is the exception: its minimum asks for
//! `fast + slow + signal` bars so the signal line has room to settle, while
//! the MACD line itself starts at `slow - 1` and the signal line at
//! `slow + signal - 2`.
//!
//! Lookbacks are capped at [`MAX_LOOKBACK`] bars.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ema::ExponentialMovingAverage;
pub use macd::{MacdOutput, MovingAverageConvergenceDivergence};
pub use rsi::RelativeStrengthIndex;
pub use sma::SimpleMovingAverage;
pub use stochastic::{StochasticOscillator, StochasticOutput};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::error::SigtraderError;
use crate::domain::price::TradingDayPrice;

/// Largest lookback any calculator accepts, roughly forty years of sessions.
pub const MAX_LOOKBACK: usize = 10_000;

/// Nullable indicator values, one per input bar.
pub type IndicatorOutput = Vec<Option<Decimal>>;

/// A calculator converts a full price series into indicator output.
pub trait IndicatorCalculator: Send + Sync {
    type Output;

    /// Display name including parameters, e.g. `SMA(20)`.
    fn name(&self) -> String;

    /// Fewest prices `calculate` accepts.
    fn minimum_prices(&self) -> usize;

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<Self::Output, SigtraderError>;
}

pub(crate) fn require_prices(
    name: &str,
    available: usize,
    required: usize,
) -> Result<(), SigtraderError> {
    if available < required {
        return Err(SigtraderError::InsufficientData {
            indicator: name.to_string(),
            required,
            available,
        });
    }
    Ok(())
}

pub(crate) fn require_lookback(name: &str, lookback: usize) -> Result<(), SigtraderError> {
    if lookback == 0 {
        return Err(SigtraderError::invalid_configuration(format!(
            "{name} lookback must be at least 1"
        )));
    }
    if lookback > MAX_LOOKBACK {
        return Err(SigtraderError::invalid_configuration(format!(
            "{name} lookback {lookback} exceeds the maximum of {MAX_LOOKBACK}"
        )));
    }
    Ok(())
}

/// Locate the consecutive non-null run in `values`.
///
/// Returns `(start, end)` with `end` exclusive. Fails when the run contains a
/// gap or is shorter than `required`.
pub(crate) fn consecutive_run(
    values: &[Option<Decimal>],
    required: usize,
    name: &str,
) -> Result<(usize, usize), SigtraderError> {
    let start = values.iter().position(Option::is_some);
    let end = values.iter().rposition(Option::is_some).map(|i| i + 1);

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(SigtraderError::InsufficientData {
                indicator: name.to_string(),
                required,
                available: 0,
            });
        }
    };

    if values[start..end].iter().any(Option::is_none) {
        return Err(SigtraderError::InsufficientData {
            indicator: name.to_string(),
            required,
            available: longest_run(&values[start..end]),
        });
    }

    require_prices(name, end - start, required)?;
    Ok((start, end))
}

fn longest_run(values: &[Option<Decimal>]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for value in values {
        if value.is_some() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Simple moving average over a nullable series.
pub(crate) fn sma_values(
    values: &[Option<Decimal>],
    lookback: usize,
    name: &str,
) -> Result<IndicatorOutput, SigtraderError> {
    let (start, end) = consecutive_run(values, lookback, name)?;
    let run: Vec<Decimal> = values[start..end].iter().copied().flatten().collect();
    let divisor = Decimal::from(lookback);

    let mut output = vec![None; values.len()];
    let mut window_sum: Decimal = run[..lookback - 1].iter().sum();
    for i in (lookback - 1)..run.len() {
        window_sum += run[i];
        output[start + i] = Some(window_sum / divisor);
        window_sum -= run[i + 1 - lookback];
    }
    Ok(output)
}

/// Exponential moving average over a nullable series, seeded with the first SMA.
pub(crate) fn ema_values(
    values: &[Option<Decimal>],
    lookback: usize,
    name: &str,
) -> Result<IndicatorOutput, SigtraderError> {
    let (start, end) = consecutive_run(values, lookback, name)?;
    let run: Vec<Decimal> = values[start..end].iter().copied().flatten().collect();

    let k = dec!(2) / Decimal::from(lookback + 1);
    let one_minus_k = Decimal::ONE - k;

    let mut output = vec![None; values.len()];
    let mut ema = run[..lookback].iter().sum::<Decimal>() / Decimal::from(lookback);
    output[start + lookback - 1] = Some(ema);

    for (offset, price) in run.iter().enumerate().skip(lookback) {
        ema = *price * k + ema * one_minus_k;
        output[start + offset] = Some(ema);
    }
    Ok(output)
}

/// Element-wise `a - b` where both sides are present.
pub(crate) fn difference(a: &[Option<Decimal>], b: &[Option<Decimal>]) -> IndicatorOutput {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(*x - *y),
            _ => None,
        })
        .collect()
}
