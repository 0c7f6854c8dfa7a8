//! Backtest command implementation

use crate::backtest::{BacktestEngine, Scenario};
use crate::config::Config;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Scenario file (JSON) with dated price and signal steps
    #[arg(long)]
    pub scenario: PathBuf,

    /// Start date filter (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date filter (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Initial capital (overrides the configured value)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Output format: json or table
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl BacktestArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        tracing::info!("Running backtest on {:?}...", self.scenario);

        let scenario = Scenario::load(&self.scenario)?;
        let steps: Vec<_> = scenario
            .steps
            .into_iter()
            .filter(|s| self.start.map_or(true, |start| s.date >= start))
            .filter(|s| self.end.map_or(true, |end| s.date <= end))
            .collect();

        let first = steps
            .first()
            .ok_or_else(|| anyhow::anyhow!("Scenario has no steps in the requested range"))?;

        let capital = self.capital.unwrap_or(config.sim.initial_capital);
        let mut engine = BacktestEngine::new(first.date, capital, config.risk.clone());
        for step in &steps {
            engine.step(step);
        }
        let report = engine.finish();

        match self.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&report)?),
            _ => println!("{}", report.metrics.format_table()),
        }

        Ok(())
    }
}
