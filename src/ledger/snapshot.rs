//! Per-step portfolio snapshot

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the equity curve. Appended once per simulation step; the first
/// entry is the initial capital with zero positions value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    /// Total portfolio value: cash + positions value
    pub value: Decimal,
    pub cash: Decimal,
    pub positions_value: Decimal,
}
