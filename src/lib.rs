//! statarb-sim: portfolio simulation and risk engine for a
//! statistical-arbitrage strategy
//!
//! This library provides the core components for:
//! - Cash/position ledger with guaranteed-fill trade application
//! - Per-instrument exposure limits and signal filtering
//! - Stop-loss liquidation and adaptive add/reduce planning
//! - Daily backtest orchestration over injected market snapshots
//! - Performance and trade-quality metrics

pub mod backtest;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod metrics;
pub mod risk;
pub mod signal;
pub mod telemetry;
