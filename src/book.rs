//! C4 — the single-symbol matching book. Combines the order index (C2) and
//! price-level tables (C3), runs the matching algorithm (§4.4.1), and drives
//! the TOB detector (C10). One book is owned by exactly one worker thread;
//! nothing here takes a lock.

use crate::errors::BookError;
use crate::order_index::{OrderIndex, OrderLocation};
use crate::pool::OrderPool;
use crate::price_level::PriceLevelTable;
use crate::tob::{TobDetector, TobMsg};
use crate::types::{
    order_key, ClientId, OrderType, Price, Quantity, Side, UserId, UserOrderId, NULL_SLOT,
    MAX_MATCH_ITERATIONS,
};

/// Raw output of a book operation, before the worker stamps on a symbol and
/// routes it to client envelopes (C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookMsg {
    Ack {
        user_id: UserId,
        user_order_id: UserOrderId,
    },
    CancelAck {
        user_id: UserId,
        user_order_id: UserOrderId,
    },
    Trade {
        buy_user_id: UserId,
        buy_user_order_id: UserOrderId,
        buy_client_id: ClientId,
        sell_user_id: UserId,
        sell_user_order_id: UserOrderId,
        sell_client_id: ClientId,
        price: Price,
        quantity: Quantity,
    },
    Tob(TobMsg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushPhase {
    Bids,
    Asks,
    Finishing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    Continue,
    Done,
}

/// Unlinks `slot` from `level`'s FIFO, fixing up neighbour links and the
/// level's head/tail. Does not touch `total_qty` or free the slot.
fn unlink_order_mut(level: &mut crate::types::PriceLevel, pool: &mut OrderPool, slot: u32) {
    let (prev, next) = {
        let order = pool.get(slot);
        (order.prev, order.next)
    };
    if prev != NULL_SLOT {
        pool.get_mut(prev).next = next;
    } else {
        level.head = next;
    }
    if next != NULL_SLOT {
        pool.get_mut(next).prev = prev;
    } else {
        level.tail = prev;
    }
}

fn link_tail(level: &mut crate::types::PriceLevel, pool: &mut OrderPool, slot: u32) {
    let qty = pool.get(slot).remaining_qty;
    pool.get_mut(slot).prev = level.tail;
    pool.get_mut(slot).next = NULL_SLOT;
    if level.tail != NULL_SLOT {
        pool.get_mut(level.tail).next = slot;
    } else {
        level.head = slot;
    }
    level.tail = slot;
    level.total_qty += qty as u64;
}

pub struct OrderBook {
    bids: PriceLevelTable,
    asks: PriceLevelTable,
    index: OrderIndex,
    tob: TobDetector,
    flush_phase: FlushPhase,
    /// Residual quantity of market orders discarded after sweeping the book
    /// dry — tracked separately per the conservation law's "filled by
    /// market" accounting (spec §8).
    pub market_discarded_qty: u64,
    next_timestamp: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook {
            bids: PriceLevelTable::new(Side::Buy),
            asks: PriceLevelTable::new(Side::Sell),
            index: OrderIndex::with_capacity(32_768),
            tob: TobDetector::new(),
            flush_phase: FlushPhase::Done,
            market_discarded_qty: 0,
            next_timestamp: 0,
        }
    }

    #[inline]
    pub fn bids(&self) -> &PriceLevelTable {
        &self.bids
    }

    #[inline]
    pub fn asks(&self) -> &PriceLevelTable {
        &self.asks
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    fn side_table(&self, side: Side) -> &PriceLevelTable {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_table_mut(&mut self, side: Side) -> &mut PriceLevelTable {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Adds a new order, matching it against the resting book first.
    ///
    /// The caller must ensure `(user_id, user_order_id)` is not already
    /// resting in this book: a duplicate key overwrites the index's location
    /// for the old order, which is the sole documented behaviour for misuse
    /// — this is a caller-error condition, not something the book recovers
    /// from gracefully.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        pool: &mut OrderPool,
        user_id: UserId,
        user_order_id: UserOrderId,
        side: Side,
        kind: OrderType,
        price: Price,
        quantity: Quantity,
        client_id: ClientId,
        out: &mut Vec<BookMsg>,
    ) -> Result<(), BookError> {
        let slot = pool.alloc()?;
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;
        {
            let order = pool.get_mut(slot);
            order.user_id = user_id;
            order.user_order_id = user_order_id;
            order.client_id = client_id;
            order.side = side;
            order.kind = kind;
            order.price = price;
            order.original_qty = quantity;
            order.remaining_qty = quantity;
            order.timestamp = timestamp;
            order.prev = NULL_SLOT;
            order.next = NULL_SLOT;
        }
        out.push(BookMsg::Ack {
            user_id,
            user_order_id,
        });

        let opposite_side = side.opposite();
        let mut iterations = 0usize;
        while pool.get(slot).remaining_qty > 0 && iterations < MAX_MATCH_ITERATIONS {
            let opposite = self.side_table(opposite_side);
            let Some(best) = opposite.best().copied() else {
                break;
            };
            let aggressor = *pool.get(slot);
            let crosses = match aggressor.kind {
                OrderType::Market => true,
                OrderType::Limit => match side {
                    Side::Buy => aggressor.price >= best.price,
                    Side::Sell => aggressor.price <= best.price,
                },
            };
            if !crosses {
                break;
            }
            let passive_slot = best.head;
            if passive_slot == NULL_SLOT {
                // Level is marked present but empty: should not happen under
                // the invariants, but fail safe by dropping it.
                self.side_table_mut(opposite_side).remove(0);
                continue;
            }
            iterations += 1;

            let passive_remaining = pool.get(passive_slot).remaining_qty;
            let fill = aggressor.remaining_qty.min(passive_remaining);
            let trade_price = best.price;

            let (buy, sell) = if side == Side::Buy {
                (aggressor, *pool.get(passive_slot))
            } else {
                (*pool.get(passive_slot), aggressor)
            };
            out.push(BookMsg::Trade {
                buy_user_id: buy.user_id,
                buy_user_order_id: buy.user_order_id,
                buy_client_id: buy.client_id,
                sell_user_id: sell.user_id,
                sell_user_order_id: sell.user_order_id,
                sell_client_id: sell.client_id,
                price: trade_price,
                quantity: fill,
            });

            pool.get_mut(slot).remaining_qty -= fill;
            pool.get_mut(passive_slot).remaining_qty -= fill;

            let opposite = self.side_table_mut(opposite_side);
            opposite.get_mut(0).total_qty -= fill as u64;

            if pool.get(passive_slot).remaining_qty == 0 {
                unlink_order_mut(opposite.get_mut(0), pool, passive_slot);
                let (pu, po) = {
                    let p = pool.get(passive_slot);
                    (p.user_id, p.user_order_id)
                };
                self.index.remove(order_key(pu, po));
                pool.free(passive_slot);
                if self.side_table(opposite_side).best().unwrap().is_empty() {
                    self.side_table_mut(opposite_side).remove(0);
                }
                // Keep walking this level / the book.
            } else {
                // Passive partially filled implies the aggressor is done.
                break;
            }
        }

        let final_order = *pool.get(slot);
        if final_order.kind == OrderType::Limit && final_order.remaining_qty > 0 {
            let table = self.side_table_mut(side);
            let level_idx = table.find_or_insert(price);
            link_tail(table.get_mut(level_idx), pool, slot);
            self.index.insert(
                order_key(user_id, user_order_id),
                OrderLocation { side, price, slot },
            )?;
        } else {
            if final_order.kind == OrderType::Market && final_order.remaining_qty > 0 {
                self.market_discarded_qty += final_order.remaining_qty as u64;
            }
            pool.free(slot);
        }

        let mut tob_out = Vec::new();
        self.tob.run(&self.bids, &self.asks, &mut tob_out);
        out.extend(tob_out.into_iter().map(BookMsg::Tob));
        Ok(())
    }

    /// Cancels an order. Idempotent: a key that is not resting still yields
    /// a `CancelAck`.
    pub fn cancel(
        &mut self,
        pool: &mut OrderPool,
        user_id: UserId,
        user_order_id: UserOrderId,
        out: &mut Vec<BookMsg>,
    ) {
        out.push(BookMsg::CancelAck {
            user_id,
            user_order_id,
        });
        let key = order_key(user_id, user_order_id);
        if let Some(loc) = self.index.remove(key) {
            let table = self.side_table_mut(loc.side);
            let level_idx = table
                .find(loc.price)
                .expect("index entry must reference a present level");
            let qty = pool.get(loc.slot).remaining_qty;
            unlink_order_mut(table.get_mut(level_idx), pool, loc.slot);
            table.get_mut(level_idx).total_qty -= qty as u64;
            pool.free(loc.slot);
            if table.get(level_idx).is_empty() {
                table.remove(level_idx);
            }
            let mut tob_out = Vec::new();
            self.tob.run(&self.bids, &self.asks, &mut tob_out);
            out.extend(tob_out.into_iter().map(BookMsg::Tob));
        }
    }

    /// Begins (or restarts, if idle) an iterative flush.
    pub fn flush(&mut self) {
        self.flush_phase = FlushPhase::Bids;
    }

    /// Drains up to `FLUSH_BATCH_SIZE` cancel acks per call. The caller
    /// drains `out` and calls this again until it returns `FlushStatus::Done`.
    pub fn continue_flush(&mut self, pool: &mut OrderPool, out: &mut Vec<BookMsg>) -> FlushStatus {
        use crate::types::FLUSH_BATCH_SIZE;
        let mut emitted = 0usize;
        loop {
            match self.flush_phase {
                FlushPhase::Bids => {
                    if self.bids.is_empty() {
                        self.flush_phase = FlushPhase::Asks;
                        continue;
                    }
                    self.drain_one(pool, Side::Buy, out);
                    emitted += 1;
                }
                FlushPhase::Asks => {
                    if self.asks.is_empty() {
                        self.flush_phase = FlushPhase::Finishing;
                        continue;
                    }
                    self.drain_one(pool, Side::Sell, out);
                    emitted += 1;
                }
                FlushPhase::Finishing => {
                    self.index.clear();
                    let mut tob_out = Vec::new();
                    self.tob.run(&self.bids, &self.asks, &mut tob_out);
                    out.extend(tob_out.into_iter().map(BookMsg::Tob));
                    self.flush_phase = FlushPhase::Done;
                    return FlushStatus::Done;
                }
                FlushPhase::Done => return FlushStatus::Done,
            }
            if emitted >= FLUSH_BATCH_SIZE {
                return FlushStatus::Continue;
            }
        }
    }

    /// Removes the head order of the best level on `side`, emitting its
    /// `CancelAck`. Does not run the TOB detector — flush runs it once at
    /// the end.
    fn drain_one(&mut self, pool: &mut OrderPool, side: Side, out: &mut Vec<BookMsg>) {
        let table = self.side_table_mut(side);
        let slot = table.get(0).head;
        debug_assert_ne!(slot, NULL_SLOT);
        let qty = pool.get(slot).remaining_qty;
        unlink_order_mut(table.get_mut(0), pool, slot);
        table.get_mut(0).total_qty -= qty as u64;
        let (uid, uoid) = {
            let o = pool.get(slot);
            (o.user_id, o.user_order_id)
        };
        pool.free(slot);
        if table.get(0).is_empty() {
            table.remove(0);
        }
        out.push(BookMsg::CancelAck {
            user_id: uid,
            user_order_id: uoid,
        });
    }

    /// Removes every order belonging to `client_id`. Returns the count
    /// removed. Runs the TOB detector once at the end.
    pub fn mass_cancel(
        &mut self,
        pool: &mut OrderPool,
        client_id: ClientId,
        out: &mut Vec<BookMsg>,
    ) -> u32 {
        let removed = self.mass_cancel_side(pool, Side::Buy, client_id, out)
            + self.mass_cancel_side(pool, Side::Sell, client_id, out);
        if removed > 0 {
            let mut tob_out = Vec::new();
            self.tob.run(&self.bids, &self.asks, &mut tob_out);
            out.extend(tob_out.into_iter().map(BookMsg::Tob));
        }
        removed
    }

    fn mass_cancel_side(
        &mut self,
        pool: &mut OrderPool,
        side: Side,
        client_id: ClientId,
        out: &mut Vec<BookMsg>,
    ) -> u32 {
        let mut removed = 0u32;
        let mut i = 0usize;
        loop {
            let table = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if i >= table.len() {
                break;
            }
            let mut slot = table.get(i).head;
            while slot != NULL_SLOT {
                let next = pool.get(slot).next;
                if pool.get(slot).client_id == client_id {
                    let qty = pool.get(slot).remaining_qty;
                    let (uid, uoid) = {
                        let o = pool.get(slot);
                        (o.user_id, o.user_order_id)
                    };
                    unlink_order_mut(table.get_mut(i), pool, slot);
                    table.get_mut(i).total_qty -= qty as u64;
                    self.index.remove(order_key(uid, uoid));
                    pool.free(slot);
                    out.push(BookMsg::CancelAck {
                        user_id: uid,
                        user_order_id: uoid,
                    });
                    removed += 1;
                }
                slot = next;
            }
            let table = self.side_table_mut(side);
            if table.get(i).is_empty() {
                table.remove(i);
            } else {
                i += 1;
            }
        }
        removed
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::N_ORDERS;

    fn new_fixture() -> (OrderBook, OrderPool) {
        (OrderBook::new(), OrderPool::new(N_ORDERS))
    }

    #[test]
    fn scenario_cross_at_passive_price() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Buy, OrderType::Limit, 10, 100, 0, &mut out)
            .unwrap();
        book.add(&mut pool, 2, 2, Side::Sell, OrderType::Limit, 11, 100, 0, &mut out)
            .unwrap();
        book.add(&mut pool, 3, 3, Side::Buy, OrderType::Limit, 11, 30, 0, &mut out)
            .unwrap();

        assert_eq!(
            out,
            vec![
                BookMsg::Ack { user_id: 1, user_order_id: 1 },
                BookMsg::Tob(TobMsg::Update { side: Side::Buy, price: 10, qty: 100 }),
                BookMsg::Ack { user_id: 2, user_order_id: 2 },
                BookMsg::Tob(TobMsg::Update { side: Side::Sell, price: 11, qty: 100 }),
                BookMsg::Ack { user_id: 3, user_order_id: 3 },
                BookMsg::Trade {
                    buy_user_id: 3, buy_user_order_id: 3, buy_client_id: 0,
                    sell_user_id: 2, sell_user_order_id: 2, sell_client_id: 0,
                    price: 11, quantity: 30,
                },
                BookMsg::Tob(TobMsg::Update { side: Side::Sell, price: 11, qty: 70 }),
            ]
        );
    }

    #[test]
    fn scenario_fifo_within_level() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Buy, OrderType::Limit, 100, 10, 0, &mut out).unwrap();
        book.add(&mut pool, 2, 2, Side::Buy, OrderType::Limit, 100, 20, 0, &mut out).unwrap();
        book.add(&mut pool, 3, 3, Side::Buy, OrderType::Limit, 100, 30, 0, &mut out).unwrap();
        out.clear();
        book.add(&mut pool, 4, 4, Side::Sell, OrderType::Limit, 100, 35, 0, &mut out).unwrap();

        assert_eq!(
            out,
            vec![
                BookMsg::Ack { user_id: 4, user_order_id: 4 },
                BookMsg::Trade {
                    buy_user_id: 1, buy_user_order_id: 1, buy_client_id: 0,
                    sell_user_id: 4, sell_user_order_id: 4, sell_client_id: 0,
                    price: 100, quantity: 10,
                },
                BookMsg::Trade {
                    buy_user_id: 2, buy_user_order_id: 2, buy_client_id: 0,
                    sell_user_id: 4, sell_user_order_id: 4, sell_client_id: 0,
                    price: 100, quantity: 20,
                },
                BookMsg::Trade {
                    buy_user_id: 3, buy_user_order_id: 3, buy_client_id: 0,
                    sell_user_id: 4, sell_user_order_id: 4, sell_client_id: 0,
                    price: 100, quantity: 5,
                },
                BookMsg::Tob(TobMsg::Update { side: Side::Buy, price: 100, qty: 25 }),
            ]
        );
    }

    #[test]
    fn scenario_market_order_sweeps_and_discards_residual() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Sell, OrderType::Limit, 100, 10, 0, &mut out).unwrap();
        out.clear();
        book.add(&mut pool, 2, 2, Side::Buy, OrderType::Market, 0, 50, 0, &mut out).unwrap();

        assert_eq!(
            out,
            vec![
                BookMsg::Ack { user_id: 2, user_order_id: 2 },
                BookMsg::Trade {
                    buy_user_id: 2, buy_user_order_id: 2, buy_client_id: 0,
                    sell_user_id: 1, sell_user_order_id: 1, sell_client_id: 0,
                    price: 100, quantity: 10,
                },
                BookMsg::Tob(TobMsg::Eliminated { side: Side::Sell }),
            ]
        );
        assert_eq!(book.market_discarded_qty, 40);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Buy, OrderType::Limit, 100, 10, 0, &mut out).unwrap();
        out.clear();
        book.cancel(&mut pool, 1, 1, &mut out);
        assert_eq!(
            out,
            vec![
                BookMsg::CancelAck { user_id: 1, user_order_id: 1 },
                BookMsg::Tob(TobMsg::Eliminated { side: Side::Buy }),
            ]
        );
        out.clear();
        book.cancel(&mut pool, 1, 1, &mut out);
        assert_eq!(out, vec![BookMsg::CancelAck { user_id: 1, user_order_id: 1 }]);
    }

    #[test]
    fn flush_emits_deterministic_order() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Buy, OrderType::Limit, 10, 100, 0, &mut out).unwrap();
        book.add(&mut pool, 1, 2, Side::Sell, OrderType::Limit, 12, 100, 0, &mut out).unwrap();
        book.add(&mut pool, 2, 101, Side::Buy, OrderType::Limit, 9, 100, 0, &mut out).unwrap();
        book.add(&mut pool, 2, 102, Side::Sell, OrderType::Limit, 11, 100, 0, &mut out).unwrap();
        out.clear();

        book.flush();
        let status = book.continue_flush(&mut pool, &mut out);
        assert_eq!(status, FlushStatus::Done);

        let cancels: Vec<_> = out
            .iter()
            .filter_map(|m| match m {
                BookMsg::CancelAck { user_id, user_order_id } => Some((*user_id, *user_order_id)),
                _ => None,
            })
            .collect();
        assert_eq!(cancels, vec![(1, 1), (2, 101), (2, 102), (1, 2)]);

        let tobs: Vec<_> = out
            .iter()
            .filter_map(|m| match m {
                BookMsg::Tob(t) => Some(*t),
                _ => None,
            })
            .collect();
        assert_eq!(
            tobs,
            vec![TobMsg::Eliminated { side: Side::Buy }, TobMsg::Eliminated { side: Side::Sell }]
        );
        assert_eq!(book.order_count(), 0);
        assert!(book.bids.is_empty());
        assert!(book.asks.is_empty());
    }

    #[test]
    fn mass_cancel_removes_only_matching_client_and_is_orthogonal() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Buy, OrderType::Limit, 10, 100, 7, &mut out).unwrap();
        book.add(&mut pool, 2, 2, Side::Buy, OrderType::Limit, 9, 100, 8, &mut out).unwrap();
        out.clear();

        let removed = book.mass_cancel(&mut pool, 7, &mut out);
        assert_eq!(removed, 1);
        assert!(out.iter().any(|m| matches!(m, BookMsg::CancelAck { user_id: 1, .. })));
        assert_eq!(book.order_count(), 1);

        out.clear();
        let removed_again = book.mass_cancel(&mut pool, 7, &mut out);
        assert_eq!(removed_again, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn self_cross_is_not_forbidden() {
        let (mut book, mut pool) = new_fixture();
        let mut out = Vec::new();
        book.add(&mut pool, 1, 1, Side::Sell, OrderType::Limit, 10, 50, 0, &mut out).unwrap();
        out.clear();
        book.add(&mut pool, 1, 2, Side::Buy, OrderType::Limit, 10, 50, 0, &mut out).unwrap();
        assert!(out.iter().any(|m| matches!(m, BookMsg::Trade { .. })));
    }

    /// Walks every level of `table`, checking §8 invariants 1 and 3, and
    /// returns the number of orders found (for the invariant-4 count check
    /// against the index below).
    fn check_table(table: &PriceLevelTable, pool: &OrderPool, side: Side, index: &OrderIndex) -> usize {
        assert!(table.is_sorted(), "levels out of price-time order");
        let mut count = 0;
        for level in table.iter() {
            assert!(level.active);
            assert_eq!(level.head == NULL_SLOT, level.tail == NULL_SLOT);
            let mut sum = 0u64;
            let mut slot = level.head;
            while slot != NULL_SLOT {
                let order = pool.get(slot);
                assert!(pool.is_live(slot));
                assert_eq!(order.price, level.price);
                assert_eq!(order.side, side);
                assert!(order.remaining_qty > 0 && order.remaining_qty <= order.original_qty);
                assert_eq!(
                    index.find(order_key(order.user_id, order.user_order_id)),
                    Some(OrderLocation { side, price: level.price, slot })
                );
                sum += order.remaining_qty as u64;
                count += 1;
                slot = order.next;
            }
            assert_eq!(sum, level.total_qty, "level total_qty drifted from its FIFO sum");
        }
        count
    }

    fn check_invariants(book: &OrderBook, pool: &OrderPool) {
        let bid_count = check_table(&book.bids, pool, Side::Buy, &book.index);
        let ask_count = check_table(&book.asks, pool, Side::Sell, &book.index);
        assert_eq!(bid_count + ask_count, book.order_count());
    }

    #[derive(Debug, Clone, Copy)]
    enum PlannedAction {
        New { user_id: u32, buy: bool, price: u32, qty: u32 },
        CancelNth(u32),
    }

    fn plan_strategy() -> impl proptest::strategy::Strategy<Value = Vec<PlannedAction>> {
        use proptest::prelude::*;
        let action = prop_oneof![
            (1u32..6, any::<bool>(), 1u32..10, 1u32..20)
                .prop_map(|(user_id, buy, price, qty)| PlannedAction::New { user_id, buy, price, qty }),
            (0u32..50).prop_map(PlannedAction::CancelNth),
        ];
        proptest::collection::vec(action, 1..200)
    }

    proptest::proptest! {
        #[test]
        fn invariants_hold_after_every_operation(plan in plan_strategy()) {
            let mut book = OrderBook::new();
            let mut pool = OrderPool::new(N_ORDERS);
            let mut placed: Vec<(u32, u32)> = Vec::new();
            let mut next_order_id = 1u32;
            let mut out = Vec::new();

            for action in plan {
                out.clear();
                match action {
                    PlannedAction::New { user_id, buy, price, qty } => {
                        let side = if buy { Side::Buy } else { Side::Sell };
                        let order_id = next_order_id;
                        next_order_id += 1;
                        if book
                            .add(&mut pool, user_id, order_id, side, OrderType::Limit, price, qty, 0, &mut out)
                            .is_ok()
                        {
                            placed.push((user_id, order_id));
                        }
                    }
                    PlannedAction::CancelNth(n) => {
                        if !placed.is_empty() {
                            let (user_id, order_id) = placed[n as usize % placed.len()];
                            book.cancel(&mut pool, user_id, order_id, &mut out);
                        }
                    }
                }
                check_invariants(&book, &pool);
            }
        }
    }
}
