//! Stop-loss liquidation

use crate::ledger::{Direction, PortfolioLedger, Trade, TradeReason};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fixed 20% adverse-move thresholds; not configurable per instrument.
const LONG_STOP_RATIO: Decimal = dec!(0.8);
const SHORT_STOP_RATIO: Decimal = dec!(1.2);

/// Scans open positions each step and force-liquidates any that breach the
/// adverse-price threshold. Positions without a quote this step are skipped.
pub struct StopLossMonitor;

impl StopLossMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Check every open position against the latest prices, liquidating
    /// breached ones. Liquidation trades are recorded with reason
    /// `stop_loss` and returned.
    pub fn check(
        &self,
        ledger: &mut PortfolioLedger,
        date: NaiveDate,
        prices: &HashMap<String, Decimal>,
    ) -> Vec<Trade> {
        let breached: Vec<(String, Decimal)> = ledger
            .positions()
            .values()
            .filter_map(|pos| {
                let &latest = prices.get(&pos.symbol)?;
                let hit = match pos.direction {
                    Direction::Long => latest < pos.entry_price * LONG_STOP_RATIO,
                    Direction::Short => latest > pos.entry_price * SHORT_STOP_RATIO,
                };
                hit.then(|| (pos.symbol.clone(), latest))
            })
            .collect();

        let mut trades = Vec::with_capacity(breached.len());
        for (symbol, latest) in breached {
            let Some((side, quantity, value)) = ledger.force_close(&symbol, latest) else {
                continue;
            };
            tracing::warn!(symbol = %symbol, price = %latest, %quantity, "stop loss triggered");
            let trade = Trade {
                date,
                symbol,
                side,
                quantity,
                price: latest,
                value,
                reason: TradeReason::StopLoss,
            };
            ledger.record(trade.clone());
            trades.push(trade);
        }
        trades
    }
}

impl Default for StopLossMonitor {
    fn default() -> Self {
        Self::new()
    }
}
