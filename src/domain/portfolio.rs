//! Cash account, fee schedule and portfolio state for one backtest run.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::position::{ClosedTrade, Position};
use crate::domain::error::SigtraderError;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Round to whole cents, half away from zero.
pub fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Brokerage charge per trade: a flat amount plus a percentage of trade value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeSchedule {
    pub flat: Decimal,
    /// Percent of trade value, e.g. `0.1` for 0.1%.
    pub percent: Decimal,
}

impl FeeSchedule {
    pub fn new(flat: Decimal, percent: Decimal) -> Result<Self, SigtraderError> {
        if flat < Decimal::ZERO || percent < Decimal::ZERO {
            return Err(SigtraderError::invalid_configuration(
                "brokerage fees must not be negative",
            ));
        }
        Ok(Self { flat, percent })
    }

    pub fn fee_for(&self, trade_value: Decimal) -> Decimal {
        to_cents(self.flat + trade_value * self.percent / dec!(100))
    }

    /// Most whole shares affordable at `price` with `funds`, fees included.
    pub fn affordable_shares(&self, funds: Decimal, price: Decimal) -> u64 {
        if price <= Decimal::ZERO || funds <= self.flat {
            return 0;
        }
        let per_share = price * (Decimal::ONE + self.percent / dec!(100));
        let mut shares = ((funds - self.flat) / per_share).floor();
        // fee rounding to cents can tip the last share over budget
        while shares > Decimal::ZERO {
            let value = shares * price;
            if value + self.fee_for(value) <= funds {
                break;
            }
            shares -= Decimal::ONE;
        }
        shares.to_u64().unwrap_or(0)
    }
}

/// Cash balance earning simple daily interest (actual/365) on idle funds.
#[derive(Debug, Clone, PartialEq)]
pub struct CashAccount {
    balance: Decimal,
    annual_rate: Decimal,
    last_accrual: Option<NaiveDate>,
    interest_earned: Decimal,
}

impl CashAccount {
    pub fn new(opening_balance: Decimal, annual_rate: Decimal) -> Self {
        Self {
            balance: opening_balance,
            annual_rate,
            last_accrual: None,
            interest_earned: Decimal::ZERO,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn interest_earned(&self) -> Decimal {
        self.interest_earned
    }

    /// Credit interest for the calendar days since the previous accrual.
    pub fn accrue_to(&mut self, date: NaiveDate) -> Decimal {
        let Some(last) = self.last_accrual else {
            self.last_accrual = Some(date);
            return Decimal::ZERO;
        };
        let days = (date - last).num_days();
        if days <= 0 {
            return Decimal::ZERO;
        }
        self.last_accrual = Some(date);
        if self.balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let interest =
            to_cents(self.balance * self.annual_rate * Decimal::from(days) / DAYS_PER_YEAR);
        self.balance += interest;
        self.interest_earned += interest;
        interest
    }

    pub fn deposit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), SigtraderError> {
        if amount > self.balance {
            return Err(SigtraderError::invalid_configuration(format!(
                "withdrawal of {amount} exceeds cash balance {}",
                self.balance
            )));
        }
        self.balance -= amount;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: CashAccount,
    pub initial_capital: Decimal,
    pub fees: FeeSchedule,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub total_fees: Decimal,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal, annual_rate: Decimal, fees: FeeSchedule) -> Self {
        Portfolio {
            cash: CashAccount::new(initial_capital, annual_rate),
            initial_capital,
            fees,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
            total_fees: Decimal::ZERO,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.position.is_some()
    }

    /// Spend all available cash on whole shares at `price`.
    ///
    /// Returns `None` when already holding or when not even one share is affordable.
    pub fn open_position(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        price: Decimal,
    ) -> Result<Option<&Position>, SigtraderError> {
        if self.position.is_some() {
            return Ok(None);
        }
        let shares = self.fees.affordable_shares(self.cash.balance(), price);
        if shares == 0 {
            return Ok(None);
        }
        let value = Decimal::from(shares) * price;
        let fee = self.fees.fee_for(value);
        self.cash.withdraw(value + fee)?;
        self.total_fees += fee;
        self.position = Some(Position {
            ticker: ticker.to_string(),
            quantity: shares,
            entry_price: price,
            entry_date: date,
            entry_fee: fee,
        });
        Ok(self.position.as_ref())
    }

    /// Sell the whole holding at `price`, returning the closed trade.
    pub fn close_position(&mut self, date: NaiveDate, price: Decimal) -> Option<&ClosedTrade> {
        let position = self.position.take()?;
        let value = position.market_value(price);
        let fee = self.fees.fee_for(value);
        self.cash.deposit(value - fee);
        self.total_fees += fee;
        self.closed_trades.push(position.close(price, date, fee));
        self.closed_trades.last()
    }

    pub fn equity(&self, price: Decimal) -> Decimal {
        let holding = self
            .position
            .as_ref()
            .map(|p| p.market_value(price))
            .unwrap_or_default();
        self.cash.balance() + holding
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: Decimal) {
        let equity = self.equity(price);
        self.equity_curve.push(EquityPoint { date, equity });
    }
}
