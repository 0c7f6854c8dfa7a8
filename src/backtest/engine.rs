//! Backtest engine: the per-step simulation loop

use super::{BacktestReport, StepData};
use crate::config::RiskLimits;
use crate::ledger::{PortfolioLedger, PortfolioSnapshot};
use crate::metrics::PerformanceMetrics;
use crate::risk::{PositionAdjustmentPlanner, RiskGate, StopLossMonitor};
use crate::signal::SignalExecutor;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// What one step did, for logging and assertions
#[derive(Debug, Clone, Copy)]
pub struct StepSummary {
    pub date: NaiveDate,
    pub signals_executed: usize,
    pub stop_losses: usize,
    pub adjustments_executed: usize,
    pub stale_quotes: usize,
}

/// Owns one run's ledger and risk components and advances them one dated
/// step at a time. Steps are strictly sequential; each run owns its state,
/// so independent runs can execute in parallel.
pub struct BacktestEngine {
    ledger: PortfolioLedger,
    gate: RiskGate,
    executor: SignalExecutor,
    stop_loss: StopLossMonitor,
    planner: PositionAdjustmentPlanner,
    snapshots: Vec<PortfolioSnapshot>,
}

impl BacktestEngine {
    /// Create an engine with the opening snapshot already recorded: initial
    /// capital, zero positions value.
    pub fn new(start_date: NaiveDate, initial_capital: Decimal, limits: RiskLimits) -> Self {
        tracing::info!(%start_date, %initial_capital, "backtest engine initialized");
        Self {
            ledger: PortfolioLedger::new(initial_capital, limits.clone()),
            gate: RiskGate::new(limits.clone()),
            executor: SignalExecutor::new(),
            stop_loss: StopLossMonitor::new(),
            planner: PositionAdjustmentPlanner::new(limits),
            snapshots: vec![PortfolioSnapshot {
                date: start_date,
                value: initial_capital,
                cash: initial_capital,
                positions_value: Decimal::ZERO,
            }],
        }
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    pub fn snapshots(&self) -> &[PortfolioSnapshot] {
        &self.snapshots
    }

    /// Run one full simulation step: mark-to-market, risk-filtered signal
    /// execution, stop-loss sweep, position adjustments, snapshot.
    pub fn step(&mut self, data: &StepData) -> StepSummary {
        let stale = self.ledger.mark_to_market(&data.prices);
        for notice in &stale {
            tracing::warn!(symbol = %notice.symbol, "no quote this step, keeping last mark");
        }

        let filtered = self.gate.filter_signals(&self.ledger, data.signals.clone());
        let signals_executed = self
            .executor
            .execute_batch(&mut self.ledger, data.date, &filtered);

        let stop_trades = self.stop_loss.check(&mut self.ledger, data.date, &data.prices);

        let adjustments = self.planner.plan(&self.ledger, &self.gate, &data.prices);
        let mut adjustments_executed = 0;
        for adjustment in &adjustments {
            let signal = adjustment.to_signal();
            match self.executor.execute(&mut self.ledger, data.date, &signal) {
                Ok(_) => adjustments_executed += 1,
                Err(e) => {
                    tracing::warn!(symbol = %signal.symbol, error = %e, "adjustment dropped")
                }
            }
        }

        let value = self.ledger.total_value(&data.prices);
        let cash = self.ledger.cash();
        self.snapshots.push(PortfolioSnapshot {
            date: data.date,
            value,
            cash,
            positions_value: value - cash,
        });

        let summary = StepSummary {
            date: data.date,
            signals_executed,
            stop_losses: stop_trades.len(),
            adjustments_executed,
            stale_quotes: stale.len(),
        };
        tracing::debug!(?summary, "step complete");
        summary
    }

    /// Finish the run: compute metrics over the recorded series
    pub fn finish(self) -> BacktestReport {
        let Self {
            ledger, snapshots, ..
        } = self;
        let trades = ledger.into_trades();
        let metrics = PerformanceMetrics::compute(&snapshots, &trades);
        tracing::info!(
            snapshots = snapshots.len(),
            trades = trades.len(),
            "backtest complete"
        );
        BacktestReport {
            snapshots,
            trades,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Side, TradeReason};
    use crate::signal::Signal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn prices(pairs: &[(&str, Decimal)]) -> HashMap<String, Decimal> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    fn step(d: u32, prices: HashMap<String, Decimal>, signals: Vec<Signal>) -> StepData {
        StepData {
            date: day(d),
            prices,
            signals,
        }
    }

    #[test]
    fn test_opening_snapshot() {
        let engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        assert_eq!(engine.snapshots().len(), 1);
        let first = &engine.snapshots()[0];
        assert_eq!(first.value, dec!(10000));
        assert_eq!(first.cash, dec!(10000));
        assert_eq!(first.positions_value, dec!(0));
    }

    #[test]
    fn test_step_executes_signal_and_snapshots() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());

        let summary = engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(0.02), dec!(100))],
        ));

        assert_eq!(summary.signals_executed, 1);
        assert_eq!(engine.ledger().positions().len(), 1);
        let snap = &engine.snapshots()[1];
        assert_eq!(snap.date, day(2));
        // cost 2, position marked back at 100: value unchanged
        assert_eq!(snap.value, dec!(10000));
        assert_eq!(snap.cash, dec!(9998));
        assert_eq!(snap.positions_value, dec!(2));
    }

    #[test]
    fn test_snapshot_identity_holds_every_step() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());

        engine.step(&step(
            2,
            prices(&[("X", dec!(100)), ("Y", dec!(50))]),
            vec![
                Signal::new("X", Side::Buy, dec!(0.02), dec!(100)),
                Signal::new("Y", Side::Sell, dec!(0.02), dec!(50)),
            ],
        ));
        engine.step(&step(3, prices(&[("X", dec!(110)), ("Y", dec!(45))]), vec![]));
        engine.step(&step(4, prices(&[("X", dec!(90))]), vec![]));

        for snap in engine.snapshots() {
            assert_eq!(snap.cash + snap.positions_value, snap.value);
        }
    }

    #[test]
    fn test_stop_loss_fires_within_step() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(0.02), dec!(100))],
        ));

        // 21% drop breaches the long stop
        let summary = engine.step(&step(3, prices(&[("X", dec!(79))]), vec![]));
        assert_eq!(summary.stop_losses, 1);
        assert!(engine.ledger().positions().is_empty());
        let last = engine.ledger().trades().last().unwrap();
        assert_eq!(last.reason, TradeReason::StopLoss);
    }

    #[test]
    fn test_adjustment_resubmitted_same_step() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(0.02), dec!(100))],
        ));

        // +15% hits the add threshold without breaching the stop
        let summary = engine.step(&step(3, prices(&[("X", dec!(115))]), vec![]));
        assert_eq!(summary.adjustments_executed, 1);

        let last = engine.ledger().trades().last().unwrap();
        assert_eq!(last.reason, TradeReason::Add);
        assert_eq!(last.quantity, dec!(0.01));
        assert_eq!(engine.ledger().positions()["X"].size, dec!(0.03));
    }

    #[test]
    fn test_clamped_signal_executes_at_initial_cap() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        let summary = engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(1), dec!(100))],
        ));

        assert_eq!(summary.signals_executed, 1);
        assert_eq!(engine.ledger().positions()["X"].size, dec!(0.025));
    }

    #[test]
    fn test_missing_prices_do_not_crash() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(0.02), dec!(100))],
        ));

        let summary = engine.step(&step(3, HashMap::new(), vec![]));
        assert_eq!(summary.stale_quotes, 1);
        // value falls back to the last mark
        assert_eq!(engine.snapshots()[2].value, dec!(10000));
    }

    #[test]
    fn test_finish_produces_report() {
        let mut engine = BacktestEngine::new(day(1), dec!(10000), RiskLimits::default());
        engine.step(&step(
            2,
            prices(&[("X", dec!(100))]),
            vec![Signal::new("X", Side::Buy, dec!(0.02), dec!(100))],
        ));
        engine.step(&step(3, prices(&[("X", dec!(110))]), vec![]));

        let report = engine.finish();
        assert_eq!(report.snapshots.len(), 3);
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.metrics.trading_days, 2);
    }
}
