//! Per-instrument exposure limits

use crate::config::RiskLimits;
use crate::ledger::PortfolioLedger;
use crate::signal::Signal;
use rust_decimal::Decimal;

/// Outcome of a limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDecision {
    /// Quantity the gate allows, possibly zero
    pub allowed: Decimal,
    /// True when the proposed quantity was clamped
    pub clamped: bool,
}

/// Enforces per-instrument position caps. Pure: reads the ledger's current
/// exposure, never mutates it.
pub struct RiskGate {
    limits: RiskLimits,
}

impl RiskGate {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Cap a proposed quantity against the instrument's limits. Fresh
    /// instruments are held to the initial position cap; instruments with
    /// open exposure may grow up to the maximum cap, floored at zero.
    pub fn max_allowed(
        &self,
        ledger: &PortfolioLedger,
        symbol: &str,
        proposed: Decimal,
    ) -> LimitDecision {
        let current = ledger.exposure(symbol);

        if current.is_zero() {
            if proposed <= self.limits.initial_position_pct {
                return LimitDecision {
                    allowed: proposed,
                    clamped: false,
                };
            }
            tracing::warn!(
                symbol,
                %proposed,
                limit = %self.limits.initial_position_pct,
                "initial position over limit, clamping"
            );
            return LimitDecision {
                allowed: self.limits.initial_position_pct,
                clamped: true,
            };
        }

        if current + proposed <= self.limits.max_position_pct {
            return LimitDecision {
                allowed: proposed,
                clamped: false,
            };
        }
        let allowed = (self.limits.max_position_pct - current).max(Decimal::ZERO);
        tracing::warn!(
            symbol,
            %proposed,
            %current,
            %allowed,
            "instrument limit exceeded, clamping increase"
        );
        LimitDecision {
            allowed,
            clamped: true,
        }
    }

    /// Apply `max_allowed` to each signal. Signals clamped to zero are
    /// dropped; clamped survivors carry the adjusted quantity and the
    /// `is_adjusted` flag.
    pub fn filter_signals(&self, ledger: &PortfolioLedger, signals: Vec<Signal>) -> Vec<Signal> {
        let mut filtered = Vec::with_capacity(signals.len());
        for mut signal in signals {
            let decision = self.max_allowed(ledger, &signal.symbol, signal.quantity);
            if decision.allowed.is_zero() {
                tracing::warn!(symbol = %signal.symbol, "signal dropped by risk gate");
                continue;
            }
            signal.quantity = decision.allowed;
            signal.is_adjusted = decision.clamped;
            filtered.push(signal);
        }
        filtered
    }
}
