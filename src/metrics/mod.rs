//! Performance and trade-quality metrics
//!
//! Ratio math runs in `f64`: the formulas need roots, fractional powers,
//! and not-a-number sentinels for undefined ratios.

mod performance;
mod trades;

pub use performance::PerformanceMetrics;
pub use trades::TradeStats;
