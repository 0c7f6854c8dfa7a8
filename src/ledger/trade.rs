//! Trade records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy: open/add long, or reduce/flip a short
    Buy,
    /// Sell: open/add short, or reduce/flip a long
    Sell,
}

/// Why a trade was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    /// Regular strategy signal
    #[default]
    Signal,
    /// Forced liquidation on adverse-move breach
    StopLoss,
    /// Position-adjustment add recommendation
    Add,
    /// Position-adjustment reduce recommendation
    Reduce,
}

/// An executed trade. Immutable once recorded; log order = execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Notional value, quantity * price
    pub value: Decimal,
    pub reason: TradeReason,
}
