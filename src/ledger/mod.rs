//! Portfolio ledger module
//!
//! Cash balance, open positions, and the append-only trade log. All trade
//! effects go through [`PortfolioLedger::apply_trade`]; a rejected trade
//! leaves the ledger unchanged.

mod portfolio;
mod position;
mod snapshot;
mod trade;
mod types;

pub use portfolio::PortfolioLedger;
pub use position::{Direction, Position};
pub use snapshot::PortfolioSnapshot;
pub use trade::{Side, Trade, TradeReason};
pub use types::{LedgerError, StaleQuote, TradeEffect};
