//! Signal types

use crate::ledger::{Side, TradeReason};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trading signal. Produced outside the core (already time-stamped by its
/// step); the core only assumes non-negative quantity and price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Instrument symbol
    pub symbol: String,
    /// Trade direction
    pub side: Side,
    /// Desired quantity
    pub quantity: Decimal,
    /// Reference price for execution
    pub price: Decimal,
    /// Optional factor score from the signal producer
    #[serde(default)]
    pub score: Option<Decimal>,
    /// Reason tag copied onto the resulting trade
    #[serde(default)]
    pub reason: TradeReason,
    /// Set by the risk gate when the quantity was clamped
    #[serde(default)]
    pub is_adjusted: bool,
}

impl Signal {
    /// Create a plain strategy signal
    pub fn new(symbol: &str, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            score: None,
            reason: TradeReason::Signal,
            is_adjusted: false,
        }
    }
}
