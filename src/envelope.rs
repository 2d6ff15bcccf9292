//! C8 — routing raw book output into client-addressed, sequenced envelopes.
//! Everything here is pure bookkeeping: no matching logic, no shared state
//! beyond the worker's own sequence counter.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::book::BookMsg;
use crate::engine::{InputMsg, SymbolMsg};
use crate::tob::TobMsg;
use crate::types::{ClientId, Price, Quantity, Side, Symbol, UserId, UserOrderId};

/// One input, as handed to the worker by the ingress stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEnvelope {
    pub client_id: ClientId,
    pub msg: InputMsg,
}

/// A `BookMsg` stamped with its symbol, addressed to the client that should
/// receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMsg {
    Ack {
        symbol: Symbol,
        user_id: UserId,
        user_order_id: UserOrderId,
    },
    CancelAck {
        symbol: Symbol,
        user_id: UserId,
        user_order_id: UserOrderId,
    },
    Trade {
        symbol: Symbol,
        buy_user_id: UserId,
        buy_user_order_id: UserOrderId,
        sell_user_id: UserId,
        sell_user_order_id: UserOrderId,
        price: Price,
        quantity: Quantity,
    },
    TopOfBookUpdate {
        symbol: Symbol,
        side: Side,
        price: Price,
        qty: u64,
    },
    TopOfBookEliminated {
        symbol: Symbol,
        side: Side,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEnvelope {
    pub client_id: ClientId,
    pub seq: u64,
    pub msg: OutputMsg,
}

/// Routes one book output into zero, one, or two output envelopes, per
/// §4.8: Ack/CancelAck/TopOfBook go to the originating client; a Trade goes
/// to each nonzero side's owner (script-mode orders use `client_id == 0` and
/// receive nothing on that side).
pub fn route(
    symbol_msg: SymbolMsg,
    originating_client: ClientId,
    seq_counter: &AtomicU64,
    out: &mut Vec<OutputEnvelope>,
) {
    let symbol = symbol_msg.symbol;
    let mut emit = |client_id: ClientId, msg: OutputMsg| {
        let seq = seq_counter.fetch_add(1, Ordering::Relaxed);
        out.push(OutputEnvelope {
            client_id,
            seq,
            msg,
        });
    };
    match symbol_msg.msg {
        BookMsg::Ack {
            user_id,
            user_order_id,
        } => emit(
            originating_client,
            OutputMsg::Ack {
                symbol,
                user_id,
                user_order_id,
            },
        ),
        BookMsg::CancelAck {
            user_id,
            user_order_id,
        } => emit(
            originating_client,
            OutputMsg::CancelAck {
                symbol,
                user_id,
                user_order_id,
            },
        ),
        BookMsg::Trade {
            buy_user_id,
            buy_user_order_id,
            buy_client_id,
            sell_user_id,
            sell_user_order_id,
            sell_client_id,
            price,
            quantity,
        } => {
            let trade = OutputMsg::Trade {
                symbol,
                buy_user_id,
                buy_user_order_id,
                sell_user_id,
                sell_user_order_id,
                price,
                quantity,
            };
            if buy_client_id != 0 {
                emit(buy_client_id, trade);
            }
            if sell_client_id != 0 {
                emit(sell_client_id, trade);
            }
        }
        BookMsg::Tob(TobMsg::Update { side, price, qty }) => emit(
            originating_client,
            OutputMsg::TopOfBookUpdate {
                symbol,
                side,
                price,
                qty,
            },
        ),
        BookMsg::Tob(TobMsg::Eliminated { side }) => emit(
            originating_client,
            OutputMsg::TopOfBookEliminated { symbol, side },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn ack_routes_to_originating_client_only() {
        let seq = AtomicU64::new(0);
        let mut out = Vec::new();
        route(
            SymbolMsg {
                symbol: sym("IBM"),
                msg: BookMsg::Ack {
                    user_id: 1,
                    user_order_id: 1,
                },
            },
            42,
            &seq,
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].client_id, 42);
        assert_eq!(out[0].seq, 0);
    }

    #[test]
    fn trade_emits_one_envelope_per_nonzero_side() {
        let seq = AtomicU64::new(0);
        let mut out = Vec::new();
        route(
            SymbolMsg {
                symbol: sym("IBM"),
                msg: BookMsg::Trade {
                    buy_user_id: 1,
                    buy_user_order_id: 1,
                    buy_client_id: 7,
                    sell_user_id: 2,
                    sell_user_order_id: 2,
                    sell_client_id: 0,
                    price: 100,
                    quantity: 10,
                },
            },
            0,
            &seq,
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].client_id, 7);
    }

    #[test]
    fn seq_is_monotonic_across_calls() {
        let seq = AtomicU64::new(0);
        let mut out = Vec::new();
        for _ in 0..3 {
            route(
                SymbolMsg {
                    symbol: sym("IBM"),
                    msg: BookMsg::CancelAck {
                        user_id: 1,
                        user_order_id: 1,
                    },
                },
                1,
                &seq,
                &mut out,
            );
        }
        let seqs: Vec<_> = out.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
