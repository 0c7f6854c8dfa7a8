//! Configuration types for statarb-sim

use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sim: SimConfig,
    #[serde(default)]
    pub risk: RiskLimits,
    pub telemetry: TelemetryConfig,
}

/// Simulation run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    pub initial_capital: Decimal,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// How short margin is accounted for when a short is reduced by a buy.
///
/// In `Legacy` mode, buying back into a
/// short neither releases the reserved margin nor realizes P&L, and
/// `total_value` margins shorts at the entry price while `mark_to_market`
/// uses the latest price. `Strict` closes both gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarginMode {
    #[default]
    Legacy,
    Strict,
}

/// Risk limits and position-adjustment thresholds, immutable for a run
#[derive(Debug, Clone, Deserialize)]
pub struct RiskLimits {
    /// Maximum position per instrument as a fraction of capital
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: Decimal,

    /// Initial position per instrument as a fraction of capital
    #[serde(default = "default_initial_position_pct")]
    pub initial_position_pct: Decimal,

    /// Loss threshold at which an add is recommended
    #[serde(default = "default_add_loss_threshold")]
    pub add_loss_threshold: Decimal,

    /// Profit threshold at which an add is recommended
    #[serde(default = "default_add_profit_threshold")]
    pub add_profit_threshold: Decimal,

    /// Loss threshold at which a near-cap position is reduced
    #[serde(default = "default_reduce_loss_threshold")]
    pub reduce_loss_threshold: Decimal,

    /// Profit threshold at which a near-cap position is reduced
    #[serde(default = "default_reduce_profit_threshold")]
    pub reduce_profit_threshold: Decimal,

    /// Fraction of the position closed by a reduce recommendation
    #[serde(default = "default_reduce_ratio")]
    pub reduce_ratio: Decimal,

    /// Fraction of short notional reserved as cash collateral
    #[serde(default = "default_margin_rate")]
    pub margin_rate: Decimal,

    #[serde(default)]
    pub margin_mode: MarginMode,
}

fn default_max_position_pct() -> Decimal {
    Decimal::new(5, 2) // 0.05 = 5%
}
fn default_initial_position_pct() -> Decimal {
    Decimal::new(25, 3) // 0.025 = 2.5%
}
fn default_add_loss_threshold() -> Decimal {
    Decimal::new(30, 2) // 0.30
}
fn default_add_profit_threshold() -> Decimal {
    Decimal::new(15, 2) // 0.15
}
fn default_reduce_loss_threshold() -> Decimal {
    Decimal::new(20, 2) // 0.20
}
fn default_reduce_profit_threshold() -> Decimal {
    Decimal::new(20, 2) // 0.20
}
fn default_reduce_ratio() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_margin_rate() -> Decimal {
    Decimal::new(1, 2) // 0.01 = 1%
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: default_max_position_pct(),
            initial_position_pct: default_initial_position_pct(),
            add_loss_threshold: default_add_loss_threshold(),
            add_profit_threshold: default_add_profit_threshold(),
            reduce_loss_threshold: default_reduce_loss_threshold(),
            reduce_profit_threshold: default_reduce_profit_threshold(),
            reduce_ratio: default_reduce_ratio(),
            margin_rate: default_margin_rate(),
            margin_mode: MarginMode::Legacy,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [sim]
            initial_capital = 10000.0

            [risk]
            max_position_pct = 0.05
            initial_position_pct = 0.025
            margin_mode = "legacy"

            [telemetry]
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sim.initial_capital, dec!(10000));
        assert_eq!(config.risk.max_position_pct, dec!(0.05));
        assert_eq!(config.risk.margin_mode, MarginMode::Legacy);
        // Unlisted thresholds fall back to defaults
        assert_eq!(config.risk.add_loss_threshold, dec!(0.30));
        assert_eq!(config.risk.reduce_ratio, dec!(0.5));
    }

    #[test]
    fn test_risk_section_optional() {
        let toml = r#"
            [sim]
            initial_capital = 500.0

            [telemetry]
            log_level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.risk.max_position_pct, dec!(0.05));
        assert_eq!(config.risk.initial_position_pct, dec!(0.025));
        assert_eq!(config.risk.margin_rate, dec!(0.01));
    }

    #[test]
    fn test_margin_mode_strict() {
        let toml = r#"
            [sim]
            initial_capital = 1000.0

            [risk]
            margin_mode = "strict"

            [telemetry]
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.risk.margin_mode, MarginMode::Strict);
    }

    #[test]
    fn test_risk_limits_default() {
        let limits = RiskLimits::default();
        assert_eq!(limits.max_position_pct, dec!(0.05));
        assert_eq!(limits.initial_position_pct, dec!(0.025));
        assert_eq!(limits.add_loss_threshold, dec!(0.30));
        assert_eq!(limits.add_profit_threshold, dec!(0.15));
        assert_eq!(limits.reduce_loss_threshold, dec!(0.20));
        assert_eq!(limits.reduce_profit_threshold, dec!(0.20));
        assert_eq!(limits.margin_rate, dec!(0.01));
        assert_eq!(limits.margin_mode, MarginMode::Legacy);
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[sim]\ninitial_capital = 25000.0\n\n[telemetry]\nlog_level = \"warn\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sim.initial_capital, dec!(25000));
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
