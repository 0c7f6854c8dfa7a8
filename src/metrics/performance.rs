//! Return, risk, and drawdown statistics over the equity curve

use super::TradeStats;
use crate::ledger::{PortfolioSnapshot, Trade};
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

const DAYS_PER_YEAR: f64 = 365.0;
/// Annual risk-free rate used for excess returns
const RISK_FREE_RATE: f64 = 0.02;

/// Serialize NaN/infinity as JSON null; undefined ratios stay representable.
pub(crate) fn non_finite_as_null<S>(v: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if v.is_finite() {
        serializer.serialize_f64(*v)
    } else {
        serializer.serialize_none()
    }
}

/// The final metrics record for a run. Undefined ratios are reported as NaN
/// sentinels, never raised as errors.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    #[serde(serialize_with = "non_finite_as_null")]
    pub total_return: f64,
    #[serde(serialize_with = "non_finite_as_null")]
    pub annualized_return: f64,
    #[serde(serialize_with = "non_finite_as_null")]
    pub sharpe_ratio: f64,
    #[serde(serialize_with = "non_finite_as_null")]
    pub sortino_ratio: f64,
    #[serde(serialize_with = "non_finite_as_null")]
    pub calmar_ratio: f64,
    /// Peak-to-trough decline, a non-positive fraction
    #[serde(serialize_with = "non_finite_as_null")]
    pub max_drawdown: f64,
    /// Date of the running maximum preceding the deepest trough
    pub drawdown_start: Option<NaiveDate>,
    /// Date of the deepest trough
    pub drawdown_end: Option<NaiveDate>,
    #[serde(serialize_with = "non_finite_as_null")]
    pub volatility: f64,
    /// Elapsed days between first and last snapshot
    pub trading_days: i64,
    pub final_value: f64,
    /// Month-over-month return of the last snapshot per calendar month,
    /// keyed `YYYY-MM`; the first month has no predecessor and is omitted
    pub monthly_returns: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub trades: TradeStats,
}

impl PerformanceMetrics {
    /// Compute the full metrics record from the ordered snapshot sequence
    /// and the trade log.
    pub fn compute(snapshots: &[PortfolioSnapshot], trades: &[Trade]) -> Self {
        let values: Vec<f64> = snapshots
            .iter()
            .map(|s| s.value.to_f64().unwrap_or(f64::NAN))
            .collect();
        let dates: Vec<NaiveDate> = snapshots.iter().map(|s| s.date).collect();

        let returns: Vec<f64> = values.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        let (total_return, trading_days, final_value) = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) => (
                last / first - 1.0,
                (dates[dates.len() - 1] - dates[0]).num_days(),
                last,
            ),
            _ => (f64::NAN, 0, f64::NAN),
        };

        let annualized_return = if trading_days > 0 {
            (1.0 + total_return).powf(DAYS_PER_YEAR / trading_days as f64) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, drawdown_start, drawdown_end) = max_drawdown(&values, &dates);

        let excess: Vec<f64> = returns
            .iter()
            .map(|r| r - RISK_FREE_RATE / DAYS_PER_YEAR)
            .collect();
        let sharpe_ratio = annualized_ratio(mean(&excess), sample_std(&excess));

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino_ratio = if downside.is_empty() {
            f64::NAN
        } else {
            annualized_ratio(mean(&returns), sample_std(&downside))
        };

        let calmar_ratio = if max_drawdown == 0.0 {
            f64::NAN
        } else {
            annualized_return / max_drawdown.abs()
        };

        let volatility = sample_std(&returns) * DAYS_PER_YEAR.sqrt();

        Self {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown,
            drawdown_start,
            drawdown_end,
            volatility,
            trading_days,
            final_value,
            monthly_returns: monthly_returns(snapshots),
            trades: TradeStats::compute(trades),
        }
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut out = format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Total Return:     {:+.2}%
Annualized:       {:+.2}%
Sharpe Ratio:     {:.2}
Sortino Ratio:    {:.2}
Calmar Ratio:     {:.2}
Max Drawdown:     {:.2}%
Volatility:       {:.2}%
Final Value:      {:.2}

TRADES
───────────────────────────────────────────────────────
Total Trades:     {}
Win Rate:         {:.1}%
Profit Factor:    {:.2}
Avg Profit:       {:.2}
Avg Loss:         {:.2}
"#,
            self.total_return * 100.0,
            self.annualized_return * 100.0,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.calmar_ratio,
            self.max_drawdown * 100.0,
            self.volatility * 100.0,
            self.final_value,
            self.trades.total_trades,
            self.trades.win_rate * 100.0,
            self.trades.profit_factor,
            self.trades.avg_profit,
            self.trades.avg_loss,
        );

        if !self.monthly_returns.is_empty() {
            out.push_str("\nMONTHLY RETURNS\n");
            out.push_str("───────────────────────────────────────────────────────\n");
            for (month, ret) in &self.monthly_returns {
                out.push_str(&format!("{month}:          {:+.2}%\n", ret * 100.0));
            }
        }
        out.push_str("══════════════════════════════════════════════════════\n");
        out
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (ddof = 1), NaN below two samples
fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// √365-annualized mean/stdev ratio, NaN when the deviation is zero or
/// undefined
fn annualized_ratio(mean: f64, std: f64) -> f64 {
    if !std.is_finite() || std == 0.0 {
        return f64::NAN;
    }
    DAYS_PER_YEAR.sqrt() * mean / std
}

fn max_drawdown(values: &[f64], dates: &[NaiveDate]) -> (f64, Option<NaiveDate>, Option<NaiveDate>) {
    let (Some(&first), Some(&first_date)) = (values.first(), dates.first()) else {
        return (0.0, None, None);
    };

    let mut peak = first;
    let mut peak_date = first_date;
    let mut worst = 0.0;
    let mut start = None;
    let mut end = None;

    for (&value, &date) in values.iter().zip(dates) {
        if value > peak {
            peak = value;
            peak_date = date;
        }
        let drawdown = value / peak - 1.0;
        if drawdown < worst {
            worst = drawdown;
            start = Some(peak_date);
            end = Some(date);
        }
    }
    (worst, start, end)
}

/// Last snapshot value per calendar month, then month-over-month change
fn monthly_returns(snapshots: &[PortfolioSnapshot]) -> BTreeMap<String, f64> {
    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for snap in snapshots {
        month_end.insert(
            (snap.date.year(), snap.date.month()),
            snap.value.to_f64().unwrap_or(f64::NAN),
        );
    }

    let mut returns = BTreeMap::new();
    let entries: Vec<_> = month_end.into_iter().collect();
    for pair in entries.windows(2) {
        let ((_, _), prev) = pair[0];
        let ((year, month), last) = pair[1];
        returns.insert(format!("{year:04}-{month:02}"), last / prev - 1.0);
    }
    returns
}
