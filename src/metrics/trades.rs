//! Trade-quality statistics from the trade log

use crate::ledger::{Side, Trade};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Win/loss statistics over realized per-trade P&L
#[derive(Debug, Clone, Default, Serialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning trades over all trades (opens included in the denominator)
    pub win_rate: f64,
    /// Gross profit over gross loss; infinite with wins and no losses
    #[serde(serialize_with = "super::performance::non_finite_as_null")]
    pub profit_factor: f64,
    pub avg_profit: f64,
    /// Mean losing-trade magnitude, reported positive
    pub avg_loss: f64,
}

/// Per-instrument replay state: running signed exposure as (direction-less
/// size, side flag) plus a weighted-average entry price.
#[derive(Debug, Default)]
struct ReplayState {
    exposure: Decimal,
    /// None while flat; Some(side that built the exposure) otherwise
    side: Option<Side>,
    avg_price: Decimal,
}

impl ReplayState {
    /// Feed one trade through the machine, returning the P&L it realized
    /// (zero for opens and same-side adds).
    fn apply(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        match self.side {
            None => {
                self.exposure = quantity;
                self.avg_price = price;
                self.side = Some(side);
                Decimal::ZERO
            }
            Some(held) if held == side => {
                self.avg_price = (self.avg_price * self.exposure + price * quantity)
                    / (self.exposure + quantity);
                self.exposure += quantity;
                Decimal::ZERO
            }
            Some(held) => {
                // Opposite side: reduce, close, or flip
                let signed = |qty: Decimal| match held {
                    Side::Buy => qty * (price - self.avg_price),
                    Side::Sell => qty * (self.avg_price - price),
                };
                if quantity >= self.exposure {
                    let profit = signed(self.exposure);
                    let remain = quantity - self.exposure;
                    if remain > Decimal::ZERO {
                        self.exposure = remain;
                        self.avg_price = price;
                        self.side = Some(side);
                    } else {
                        self.exposure = Decimal::ZERO;
                        self.side = None;
                    }
                    profit
                } else {
                    self.exposure -= quantity;
                    signed(quantity)
                }
            }
        }
    }
}

impl TradeStats {
    /// Replay the trade log per instrument and aggregate realized P&L into
    /// win/loss statistics.
    pub fn compute(trades: &[Trade]) -> Self {
        let mut states: HashMap<&str, ReplayState> = HashMap::new();
        let realized: Vec<Decimal> = trades
            .iter()
            .map(|trade| {
                states
                    .entry(trade.symbol.as_str())
                    .or_default()
                    .apply(trade.side, trade.quantity, trade.price)
            })
            .collect();
        Self::from_realized(&realized, trades.len())
    }

    /// Aggregate a realized-P&L series (one entry per trade, zero for trades
    /// that closed nothing) over a log of `total_trades` trades.
    pub fn from_realized(realized: &[Decimal], total_trades: usize) -> Self {
        if total_trades == 0 {
            return Self::default();
        }

        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        let mut wins = 0usize;
        let mut losses = 0usize;

        for &profit in realized {
            if profit > Decimal::ZERO {
                wins += 1;
                total_profit += profit;
            } else if profit < Decimal::ZERO {
                losses += 1;
                total_loss += -profit;
            }
        }

        let total_profit = total_profit.to_f64().unwrap_or(f64::NAN);
        let total_loss = total_loss.to_f64().unwrap_or(f64::NAN);

        let profit_factor = if total_loss > 0.0 {
            total_profit / total_loss
        } else if total_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Self {
            total_trades,
            winning_trades: wins,
            losing_trades: losses,
            win_rate: wins as f64 / total_trades as f64,
            profit_factor,
            avg_profit: if wins > 0 {
                total_profit / wins as f64
            } else {
                0.0
            },
            avg_loss: if losses > 0 {
                total_loss / losses as f64
            } else {
                0.0
            },
        }
    }
}
