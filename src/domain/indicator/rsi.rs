//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)), and 100 when avg_loss == 0.
//!
//! Warmup: first n bars are `None` (n price changes are needed for the first average).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_lookback, require_prices, IndicatorCalculator, IndicatorOutput,
};
use crate::domain::price::TradingDayPrice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeStrengthIndex {
    lookback: usize,
}

impl RelativeStrengthIndex {
    pub fn new(lookback: usize) -> Result<Self, SigtraderError> {
        require_lookback("RSI", lookback)?;
        Ok(Self { lookback })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return dec!(100);
    }
    let rs = avg_gain / avg_loss;
    dec!(100) - dec!(100) / (Decimal::ONE + rs)
}

impl IndicatorCalculator for RelativeStrengthIndex {
    type Output = IndicatorOutput;

    fn name(&self) -> String {
        format!("RSI({})", self.lookback)
    }

    fn minimum_prices(&self) -> usize {
        self.lookback + 1
    }

    fn calculate(&self, prices: &[TradingDayPrice]) -> Result<IndicatorOutput, SigtraderError> {
        require_prices(&self.name(), prices.len(), self.minimum_prices())?;

        let period = self.lookback;
        let divisor = Decimal::from(period);
        let carried = Decimal::from(period - 1);

        let (gains, losses): (Vec<Decimal>, Vec<Decimal>) = prices
            .windows(2)
            .map(|pair| {
                let change = pair[1].close - pair[0].close;
                if change.is_sign_positive() {
                    (change, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, -change)
                }
            })
            .unzip();

        let mut output = vec![None; prices.len()];
        let mut avg_gain = gains[..period].iter().sum::<Decimal>() / divisor;
        let mut avg_loss = losses[..period].iter().sum::<Decimal>() / divisor;
        output[period] = Some(rsi_value(avg_gain, avg_loss));

        for change_idx in period..gains.len() {
            avg_gain = (avg_gain * carried + gains[change_idx]) / divisor;
            avg_loss = (avg_loss * carried + losses[change_idx]) / divisor;
            output[change_idx + 1] = Some(rsi_value(avg_gain, avg_loss));
        }

        Ok(output)
    }
}
