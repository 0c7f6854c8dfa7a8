//! Portfolio ledger: cash, open positions, trade log

use super::{Direction, LedgerError, Position, Side, StaleQuote, Trade, TradeEffect};
use crate::config::{MarginMode, RiskLimits};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Owns the cash balance, open positions, and the append-only trade log for
/// one simulation run. `apply_trade` is the sole mutation point for regular
/// trades; stop-loss liquidations go through `force_close`.
///
/// Positions are kept in a `BTreeMap` so every scan (mark-to-market,
/// stop-loss, adjustment planning) runs in a reproducible order.
pub struct PortfolioLedger {
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    trades: Vec<Trade>,
    limits: RiskLimits,
}

impl PortfolioLedger {
    pub fn new(initial_capital: Decimal, limits: RiskLimits) -> Self {
        Self {
            cash: initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            limits,
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Current open size for an instrument, zero when flat
    pub fn exposure(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.size)
            .unwrap_or(Decimal::ZERO)
    }

    /// Append an executed trade to the log
    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Apply a guaranteed-fill trade to the book.
    ///
    /// Rejects with [`LedgerError::InsufficientFunds`] (no state change) when
    /// the cash balance cannot cover a buy cost or a short margin reserve.
    pub fn apply_trade(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<TradeEffect, LedgerError> {
        match side {
            Side::Buy => self.apply_buy(symbol, quantity, price),
            Side::Sell => self.apply_sell(symbol, quantity, price),
        }
    }

    fn apply_buy(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<TradeEffect, LedgerError> {
        let existing = self
            .positions
            .get(symbol)
            .map(|p| (p.direction, p.size, p.entry_price));

        if let Some((Direction::Short, size, entry)) = existing {
            if self.limits.margin_mode == MarginMode::Strict {
                return self.apply_buy_on_short_strict(symbol, quantity, price, size, entry);
            }
        }

        // Legacy accounting pays full cost for every buy, including buys
        // that reduce a short. No margin is released and no P&L realized.
        let cost = quantity * price;
        if cost > self.cash {
            return Err(LedgerError::InsufficientFunds {
                symbol: symbol.to_string(),
                required: cost,
                available: self.cash,
            });
        }
        self.cash -= cost;

        match existing {
            None => {
                self.positions
                    .insert(symbol.to_string(), Position::open(symbol, Direction::Long, quantity, price));
                Ok(TradeEffect::Opened)
            }
            Some((Direction::Long, _, _)) => {
                if let Some(pos) = self.positions.get_mut(symbol) {
                    pos.add(quantity, price);
                }
                Ok(TradeEffect::Added)
            }
            Some((Direction::Short, size, _)) => {
                if quantity > size {
                    let remain = quantity - size;
                    self.positions
                        .insert(symbol.to_string(), Position::open(symbol, Direction::Long, remain, price));
                    Ok(TradeEffect::Flipped)
                } else if quantity == size {
                    self.positions.remove(symbol);
                    Ok(TradeEffect::Closed)
                } else {
                    if let Some(pos) = self.positions.get_mut(symbol) {
                        pos.size -= quantity;
                    }
                    Ok(TradeEffect::Reduced)
                }
            }
        }
    }

    /// Strict-mode short reduction: release margin on the closed quantity,
    /// realize its P&L, and pay cost only for the excess that flips long.
    fn apply_buy_on_short_strict(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        size: Decimal,
        entry: Decimal,
    ) -> Result<TradeEffect, LedgerError> {
        let closed = quantity.min(size);
        let refund = closed * entry * self.limits.margin_rate + closed * (entry - price);
        let excess = quantity - closed;
        let cost = excess * price;

        if cost - refund > self.cash {
            return Err(LedgerError::InsufficientFunds {
                symbol: symbol.to_string(),
                required: cost - refund,
                available: self.cash,
            });
        }
        self.cash = self.cash + refund - cost;

        if excess > Decimal::ZERO {
            self.positions
                .insert(symbol.to_string(), Position::open(symbol, Direction::Long, excess, price));
            Ok(TradeEffect::Flipped)
        } else if closed == size {
            self.positions.remove(symbol);
            Ok(TradeEffect::Closed)
        } else {
            if let Some(pos) = self.positions.get_mut(symbol) {
                pos.size -= closed;
            }
            Ok(TradeEffect::Reduced)
        }
    }

    fn apply_sell(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<TradeEffect, LedgerError> {
        let existing = self.positions.get(symbol).map(|p| (p.direction, p.size));

        match existing {
            None | Some((Direction::Short, _)) => {
                let margin = quantity * price * self.limits.margin_rate;
                if margin > self.cash {
                    return Err(LedgerError::InsufficientFunds {
                        symbol: symbol.to_string(),
                        required: margin,
                        available: self.cash,
                    });
                }
                self.cash -= margin;
                match self.positions.get_mut(symbol) {
                    Some(pos) => {
                        pos.add(quantity, price);
                        Ok(TradeEffect::Added)
                    }
                    None => {
                        self.positions.insert(
                            symbol.to_string(),
                            Position::open(symbol, Direction::Short, quantity, price),
                        );
                        Ok(TradeEffect::Opened)
                    }
                }
            }
            Some((Direction::Long, size)) => {
                if quantity > size {
                    // Close the long at full size, then try to open the
                    // remainder as a short with margin drawn from proceeds.
                    self.cash += size * price;
                    self.positions.remove(symbol);

                    let remain = quantity - size;
                    let margin = remain * price * self.limits.margin_rate;
                    if margin > self.cash {
                        tracing::warn!(
                            symbol,
                            %margin,
                            available = %self.cash,
                            "short leg of flip unaffordable, long closed without flip"
                        );
                        return Ok(TradeEffect::ClosedWithoutFlip { closed: size });
                    }
                    self.cash -= margin;
                    self.positions.insert(
                        symbol.to_string(),
                        Position::open(symbol, Direction::Short, remain, price),
                    );
                    Ok(TradeEffect::Flipped)
                } else {
                    self.cash += quantity * price;
                    if quantity == size {
                        self.positions.remove(symbol);
                        Ok(TradeEffect::Closed)
                    } else {
                        if let Some(pos) = self.positions.get_mut(symbol) {
                            pos.size -= quantity;
                        }
                        Ok(TradeEffect::Reduced)
                    }
                }
            }
        }
    }

    /// Re-mark every open position against the given price map. Positions
    /// without a quote keep their previous mark and are reported back.
    pub fn mark_to_market(&mut self, prices: &HashMap<String, Decimal>) -> Vec<StaleQuote> {
        let mut stale = Vec::new();
        let margin_rate = self.limits.margin_rate;
        let strict = self.limits.margin_mode == MarginMode::Strict;

        for pos in self.positions.values_mut() {
            let Some(&price) = prices.get(&pos.symbol) else {
                stale.push(StaleQuote {
                    symbol: pos.symbol.clone(),
                });
                continue;
            };
            pos.last_price = price;
            match pos.direction {
                Direction::Long => {
                    pos.market_value = pos.size * price;
                    pos.unrealized_pnl = pos.size * (price - pos.entry_price);
                }
                Direction::Short => {
                    pos.unrealized_pnl = pos.size * (pos.entry_price - price);
                    pos.market_value = if strict {
                        pos.size * pos.entry_price * margin_rate + pos.unrealized_pnl
                    } else {
                        // Legacy marks the margin component at the latest
                        // price, unlike total_value which uses entry.
                        pos.size * price * margin_rate
                    };
                }
            }
        }
        stale
    }

    /// Total portfolio value: cash + per-position value. Longs use the latest
    /// quote (falling back to the last mark); shorts are valued as reserved
    /// margin at entry price plus floating P&L.
    pub fn total_value(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        let mut positions_value = Decimal::ZERO;
        for pos in self.positions.values() {
            let latest = prices.get(&pos.symbol).copied().unwrap_or(pos.last_price);
            positions_value += match pos.direction {
                Direction::Long => pos.size * latest,
                Direction::Short => {
                    pos.size * pos.entry_price * self.limits.margin_rate
                        + pos.size * (pos.entry_price - latest)
                }
            };
        }
        self.cash + positions_value
    }

    /// Force-close a position at the given price, crediting cash with the
    /// liquidation proceeds. Longs receive size * price; shorts receive the
    /// margin reserved at entry plus realized P&L. Returns the closing side,
    /// quantity, and notional for the caller to record.
    pub fn force_close(&mut self, symbol: &str, price: Decimal) -> Option<(Side, Decimal, Decimal)> {
        let pos = self.positions.remove(symbol)?;
        let notional = pos.size * price;
        let side = match pos.direction {
            Direction::Long => {
                self.cash += notional;
                Side::Sell
            }
            Direction::Short => {
                self.cash += pos.size * pos.entry_price * self.limits.margin_rate;
                self.cash += pos.size * (pos.entry_price - price);
                Side::Buy
            }
        };
        if self.cash < Decimal::ZERO {
            // The thin margin reserve cannot absorb a large adverse move;
            // the loss is booked as-is but must not pass silently.
            tracing::error!(
                symbol,
                %price,
                cash = %self.cash,
                "forced close drove cash negative"
            );
        }
        Some((side, pos.size, notional))
    }
}
