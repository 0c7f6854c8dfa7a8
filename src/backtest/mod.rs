//! Backtest orchestration
//!
//! Drives one simulation step per dated market snapshot: risk-filtered
//! signal execution, stop-loss liquidation, position adjustment, then a
//! portfolio snapshot. Metrics run once over the full series afterwards.

mod engine;

pub use engine::{BacktestEngine, StepSummary};

use crate::ledger::{PortfolioSnapshot, Trade};
use crate::metrics::PerformanceMetrics;
use crate::signal::Signal;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One step of injected market data: latest prices per instrument plus the
/// signals produced for that date. Absent prices are legal.
#[derive(Debug, Clone, Deserialize)]
pub struct StepData {
    pub date: NaiveDate,
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

/// A full scenario: ordered steps, typically one per trading day
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub steps: Vec<StepData>,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&content)?;
        Ok(scenario)
    }
}

/// Everything a finished run produces: the equity curve, the trade log, and
/// the computed metrics record.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub snapshots: Vec<PortfolioSnapshot>,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
}
