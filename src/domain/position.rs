//! Open positions and closed trades.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Whole-share long holding.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub entry_date: NaiveDate,
    pub entry_fee: Decimal,
}

impl Position {
    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.quantity) * price
    }

    pub fn cost_basis(&self) -> Decimal {
        self.market_value(self.entry_price)
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.market_value(price) - self.cost_basis()
    }

    /// Close the position, charging `exit_fee` against the proceeds.
    pub fn close(self, exit_price: Decimal, exit_date: NaiveDate, exit_fee: Decimal) -> ClosedTrade {
        let fees = self.entry_fee + exit_fee;
        let pnl = self.unrealized_pnl(exit_price) - fees;
        ClosedTrade {
            ticker: self.ticker,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price,
            entry_date: self.entry_date,
            exit_date,
            fees,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub ticker: String,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub fees: Decimal,
    /// Net of entry and exit fees.
    pub pnl: Decimal,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
