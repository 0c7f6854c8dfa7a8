//! Signal execution against the ledger

use super::Signal;
use crate::ledger::{LedgerError, PortfolioLedger, Trade, TradeEffect};
use chrono::NaiveDate;

/// Turns risk-filtered signals into ledger mutations and trade records.
/// A signal rejected by the ledger is dropped with a warning; the batch
/// continues with the remaining signals.
pub struct SignalExecutor;

impl SignalExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute one signal. On success the resulting trade is appended to the
    /// ledger's trade log with the signal's reason tag.
    pub fn execute(
        &self,
        ledger: &mut PortfolioLedger,
        date: NaiveDate,
        signal: &Signal,
    ) -> Result<TradeEffect, LedgerError> {
        let effect = ledger.apply_trade(&signal.symbol, signal.side, signal.quantity, signal.price)?;
        // A dropped flip leg executes only the closing quantity; the log
        // records what actually traded, not what was asked for.
        let quantity = match effect {
            TradeEffect::ClosedWithoutFlip { closed } => closed,
            _ => signal.quantity,
        };
        ledger.record(Trade {
            date,
            symbol: signal.symbol.clone(),
            side: signal.side,
            quantity,
            price: signal.price,
            value: quantity * signal.price,
            reason: signal.reason,
        });
        tracing::debug!(
            symbol = %signal.symbol,
            side = ?signal.side,
            quantity = %signal.quantity,
            price = %signal.price,
            ?effect,
            "executed signal"
        );
        Ok(effect)
    }

    /// Execute a batch in order, continuing past rejections. Returns the
    /// number of signals that executed.
    pub fn execute_batch(
        &self,
        ledger: &mut PortfolioLedger,
        date: NaiveDate,
        signals: &[Signal],
    ) -> usize {
        let mut executed = 0;
        for signal in signals {
            match self.execute(ledger, date, signal) {
                Ok(_) => executed += 1,
                Err(e) => {
                    tracing::warn!(symbol = %signal.symbol, error = %e, "signal dropped");
                }
            }
        }
        executed
    }
}

impl Default for SignalExecutor {
    fn default() -> Self {
        Self::new()
    }
}
