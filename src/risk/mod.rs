//! Risk management module
//!
//! Per-instrument exposure limits, stop-loss liquidation, and adaptive
//! position-adjustment rules.

mod adjust;
mod gate;
mod stop_loss;

pub use adjust::{Adjustment, AdjustmentAction, PositionAdjustmentPlanner};
pub use gate::{LimitDecision, RiskGate};
pub use stop_loss::StopLossMonitor;
