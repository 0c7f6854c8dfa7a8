//! Ledger error and notice types

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from trade application
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Trade would push cash below zero; nothing was mutated
    #[error("insufficient funds for {symbol}: need {required}, have {available}")]
    InsufficientFunds {
        symbol: String,
        required: Decimal,
        available: Decimal,
    },
}

/// Non-fatal notice: no quote for an open position in the current step.
/// The position keeps its last known price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleQuote {
    pub symbol: String,
}

/// What a successfully applied trade did to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeEffect {
    /// New position created
    Opened,
    /// Same-direction size increase with weighted-average re-pricing
    Added,
    /// Opposite-direction partial close
    Reduced,
    /// Position fully closed
    Closed,
    /// Position closed and re-opened in the opposite direction
    Flipped,
    /// Long closed by an oversized sell, but the short leg was dropped
    /// because its margin was unaffordable. Carries the quantity that
    /// actually executed so callers can record the trade truthfully.
    ClosedWithoutFlip { closed: Decimal },
}
