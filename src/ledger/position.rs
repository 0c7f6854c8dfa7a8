//! Open position aggregate

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profits when price rises
    Long,
    /// Profits when price falls; carries reserved margin
    Short,
}

/// An open position, uniquely keyed by instrument. At most one exists per
/// instrument; size stays positive while the position is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub size: Decimal,
    /// Size-weighted average acquisition price
    pub entry_price: Decimal,
    /// Last price seen by mark-to-market (entry price until first mark)
    pub last_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    pub fn open(symbol: &str, direction: Direction, size: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction,
            size,
            entry_price: price,
            last_price: price,
            market_value: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    /// Same-direction add with weighted-average re-pricing
    pub fn add(&mut self, quantity: Decimal, price: Decimal) {
        let new_size = self.size + quantity;
        self.entry_price = (self.entry_price * self.size + price * quantity) / new_size;
        self.size = new_size;
    }

    /// Signed return against entry: positive when the position is in profit
    pub fn pnl_pct(&self, latest: Decimal) -> Decimal {
        match self.direction {
            Direction::Long => (latest - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - latest) / self.entry_price,
        }
    }
}
