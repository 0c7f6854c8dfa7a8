//! Adaptive add/reduce position adjustments

use super::RiskGate;
use crate::config::RiskLimits;
use crate::ledger::{Direction, PortfolioLedger, Side, TradeReason};
use crate::signal::Signal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use uuid::Uuid;

/// A position is "near the cap" once it holds 90% of the maximum size.
const NEAR_CAP_RATIO: Decimal = dec!(0.9);

/// Recommended adjustment action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentAction {
    Increase,
    Reduce,
}

/// An add/reduce recommendation for an open position. Converted back into a
/// signal and resubmitted through the executor within the same step.
#[derive(Debug, Clone)]
pub struct Adjustment {
    pub symbol: String,
    pub direction: Direction,
    pub action: AdjustmentAction,
    pub current_quantity: Decimal,
    pub quantity: Decimal,
    /// Latest price the recommendation was computed against
    pub price: Decimal,
    pub reason: String,
}

impl Adjustment {
    /// Express the recommendation as an executable signal. Increases trade
    /// in the position's direction, reduces against it.
    pub fn to_signal(&self) -> Signal {
        let (side, reason) = match (self.action, self.direction) {
            (AdjustmentAction::Increase, Direction::Long) => (Side::Buy, TradeReason::Add),
            (AdjustmentAction::Increase, Direction::Short) => (Side::Sell, TradeReason::Add),
            (AdjustmentAction::Reduce, Direction::Long) => (Side::Sell, TradeReason::Reduce),
            (AdjustmentAction::Reduce, Direction::Short) => (Side::Buy, TradeReason::Reduce),
        };
        Signal {
            id: Uuid::new_v4(),
            symbol: self.symbol.clone(),
            side,
            quantity: self.quantity,
            price: self.price,
            score: None,
            reason,
            is_adjusted: false,
        }
    }
}

/// Inspects unrealized P&L of open positions and emits add/reduce
/// recommendations per the configured thresholds.
pub struct PositionAdjustmentPlanner {
    limits: RiskLimits,
}

impl PositionAdjustmentPlanner {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Produce recommendations for every open position, in ledger order.
    /// Positions without a quote this step use their last known price.
    pub fn plan(
        &self,
        ledger: &PortfolioLedger,
        gate: &RiskGate,
        prices: &HashMap<String, Decimal>,
    ) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();

        for pos in ledger.positions().values() {
            let latest = prices.get(&pos.symbol).copied().unwrap_or(pos.last_price);
            let pnl_pct = pos.pnl_pct(latest);
            let near_cap = pos.size >= self.limits.max_position_pct * NEAR_CAP_RATIO;

            if near_cap {
                if pnl_pct <= -self.limits.reduce_loss_threshold
                    || pnl_pct >= self.limits.reduce_profit_threshold
                {
                    adjustments.push(Adjustment {
                        symbol: pos.symbol.clone(),
                        direction: pos.direction,
                        action: AdjustmentAction::Reduce,
                        current_quantity: pos.size,
                        quantity: pos.size * self.limits.reduce_ratio,
                        price: latest,
                        reason: format!("near cap with pnl {pnl_pct:.4}, reducing"),
                    });
                }
            } else if pnl_pct <= -self.limits.add_loss_threshold
                || pnl_pct >= self.limits.add_profit_threshold
            {
                let decision = gate.max_allowed(ledger, &pos.symbol, pos.size * dec!(0.5));
                if decision.allowed.is_zero() {
                    tracing::debug!(symbol = %pos.symbol, "no headroom, add suppressed");
                    continue;
                }
                adjustments.push(Adjustment {
                    symbol: pos.symbol.clone(),
                    direction: pos.direction,
                    action: AdjustmentAction::Increase,
                    current_quantity: pos.size,
                    quantity: decision.allowed,
                    price: latest,
                    reason: format!("pnl {pnl_pct:.4} past add threshold, adding"),
                });
            }
        }

        if !adjustments.is_empty() {
            tracing::info!(count = adjustments.len(), "position adjustments planned");
        }
        adjustments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> PositionAdjustmentPlanner {
        PositionAdjustmentPlanner::new(RiskLimits::default())
    }

    fn gate() -> RiskGate {
        RiskGate::new(RiskLimits::default())
    }

    fn prices(pairs: &[(&str, Decimal)]) -> HashMap<String, Decimal> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    fn ledger_with_long(size: Decimal, entry: Decimal) -> PortfolioLedger {
        let mut ledger = PortfolioLedger::new(dec!(10000), RiskLimits::default());
        ledger.apply_trade("X", Side::Buy, size, entry).unwrap();
        ledger
    }

    #[test]
    fn test_add_on_deep_loss() {
        // size 0.02 long at 100, latest 70 -> pnl -30%
        let ledger = ledger_with_long(dec!(0.02), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(70))]));

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].action, AdjustmentAction::Increase);
        // min(size * 0.5 = 0.01, headroom 0.03) = 0.01
        assert_eq!(plans[0].quantity, dec!(0.01));
        let signal = plans[0].to_signal();
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.reason, TradeReason::Add);
    }

    #[test]
    fn test_add_on_profit_threshold() {
        // +15% exactly triggers
        let ledger = ledger_with_long(dec!(0.02), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(115))]));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].action, AdjustmentAction::Increase);
    }

    #[test]
    fn test_no_adjustment_in_quiet_band() {
        let ledger = ledger_with_long(dec!(0.02), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(105))]));
        assert!(plans.is_empty());
    }

    #[test]
    fn test_add_clamped_by_headroom() {
        // size 0.04: half is 0.02 but headroom to the 0.05 cap is 0.01
        let ledger = ledger_with_long(dec!(0.04), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(60))]));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].quantity, dec!(0.01));
    }

    #[test]
    fn test_add_suppressed_without_headroom() {
        // gate capped tighter than the planner's near-cap bound: the add
        // qualifies but the approved headroom is zero, so it is suppressed
        let tight_gate = RiskGate::new(RiskLimits {
            max_position_pct: dec!(0.03),
            ..RiskLimits::default()
        });
        let ledger = ledger_with_long(dec!(0.035), dec!(100));

        let plans = planner().plan(&ledger, &tight_gate, &prices(&[("X", dec!(60))]));
        assert!(plans.is_empty());
    }

    #[test]
    fn test_reduce_near_cap_on_loss() {
        // size 0.045 >= 0.9 * 0.05, pnl -20%
        let ledger = ledger_with_long(dec!(0.045), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(80))]));

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].action, AdjustmentAction::Reduce);
        assert_eq!(plans[0].quantity, dec!(0.0225));
        let signal = plans[0].to_signal();
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.reason, TradeReason::Reduce);
    }

    #[test]
    fn test_reduce_near_cap_on_profit() {
        let ledger = ledger_with_long(dec!(0.045), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(120))]));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].action, AdjustmentAction::Reduce);
    }

    #[test]
    fn test_near_cap_quiet_band_no_reduce() {
        let ledger = ledger_with_long(dec!(0.045), dec!(100));
        let plans = planner().plan(&ledger, &gate(), &prices(&[("X", dec!(90))]));
        assert!(plans.is_empty());
    }

    #[test]
    fn test_short_add_signal_sells() {
        let mut ledger = PortfolioLedger::new(dec!(10000), RiskLimits::default());
        ledger.apply_trade("S", Side::Sell, dec!(0.02), dec!(100)).unwrap();

        // short at 100, latest 130 -> pnl -30% triggers add
        let plans = planner().plan(&ledger, &gate(), &prices(&[("S", dec!(130))]));
        assert_eq!(plans.len(), 1);
        let signal = plans[0].to_signal();
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.reason, TradeReason::Add);
    }

    #[test]
    fn test_missing_quote_uses_last_price() {
        let mut ledger = ledger_with_long(dec!(0.02), dec!(100));
        ledger.mark_to_market(&prices(&[("X", dec!(70))]));

        // no quote this step; last mark at 70 still implies -30%
        let plans = planner().plan(&ledger, &gate(), &HashMap::new());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].price, dec!(70));
    }
}
