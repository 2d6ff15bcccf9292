//! C10 — top-of-book change detection. One instance per book, tracking the
//! previous best bid/ask so `OrderBook` mutations emit deltas only when the
//! visible top actually changes, with the elimination message gated by a
//! sticky "this side was ever active" flag so an empty book never emits a
//! spurious elimination before its first order.

use crate::price_level::PriceLevelTable;
use crate::types::{Price, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TobMsg {
    Update { side: Side, price: Price, qty: u64 },
    Eliminated { side: Side },
}

#[derive(Default)]
pub struct TobDetector {
    prev_bid: (Price, u64),
    prev_ask: (Price, u64),
    bid_ever_active: bool,
    ask_ever_active: bool,
}

impl TobDetector {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(side_table: &PriceLevelTable) -> (Price, u64) {
        match side_table.best() {
            Some(level) => (level.price, level.total_qty),
            None => (0, 0),
        }
    }

    /// Runs the detector against both sides, appending at most one message
    /// per side (bid checked before ask, per spec).
    pub fn run(&mut self, bids: &PriceLevelTable, asks: &PriceLevelTable, out: &mut Vec<TobMsg>) {
        self.check_side(Side::Buy, Self::current(bids), out);
        self.check_side(Side::Sell, Self::current(asks), out);
    }

    fn check_side(&mut self, side: Side, current: (Price, u64), out: &mut Vec<TobMsg>) {
        let (prev, ever_active) = match side {
            Side::Buy => (&mut self.prev_bid, &mut self.bid_ever_active),
            Side::Sell => (&mut self.prev_ask, &mut self.ask_ever_active),
        };
        if current.0 > 0 {
            *ever_active = true;
        }
        if current != *prev {
            if current.0 == 0 {
                if *ever_active {
                    out.push(TobMsg::Eliminated { side });
                }
            } else {
                out.push(TobMsg::Update {
                    side,
                    price: current.0,
                    qty: current.1,
                });
            }
        }
        *prev = current;
    }
}
