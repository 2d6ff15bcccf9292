//! C5 — the matching engine: symbol-indexed books sharing one order pool.
//! Dispatches input messages to the book they target and keeps the
//! order-key-to-symbol map that lets a bare `Cancel` find its book.

use crate::book::{BookMsg, FlushStatus, OrderBook};
use crate::errors::EngineError;
use crate::hash::{fnv1a, mix64};
use crate::pool::OrderPool;
use crate::types::{
    order_key, ClientId, OrderKey, OrderType, Price, Quantity, Side, Symbol, UserId, UserOrderId,
    MAX_PROBE, MAX_SYMBOLS, N_ORDERS,
};

/// What a worker asks the engine to do with one input envelope's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMsg {
    NewOrder {
        symbol: Symbol,
        user_id: UserId,
        user_order_id: UserOrderId,
        side: Side,
        kind: OrderType,
        price: Price,
        quantity: Quantity,
    },
    Cancel {
        user_id: UserId,
        user_order_id: UserOrderId,
    },
    Flush,
    /// In-band mass-cancel: removes every resting order submitted under
    /// `client_id`, across every book.
    MassCancel {
        client_id: ClientId,
    },
}

/// A `BookMsg` plus which symbol produced it, so the worker can label
/// outbound envelopes before routing (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMsg {
    pub symbol: Symbol,
    pub msg: BookMsg,
}

/// Open-addressed symbol → book-index map. Small, fixed-capacity, no
/// per-entry allocation — the same open-addressing shape as `OrderIndex`
/// but keyed by symbol bytes via FNV-1a instead of the order-key mix.
struct SymbolTable {
    slots: Vec<Option<(Symbol, usize)>>,
    mask: usize,
    len: usize,
}

impl SymbolTable {
    fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.next_power_of_two();
        SymbolTable {
            slots: vec![None; cap],
            mask: cap - 1,
            len: 0,
        }
    }

    fn find(&self, symbol: &Symbol) -> Option<usize> {
        let start = (fnv1a(symbol.as_bytes()) as usize) & self.mask;
        for probe in 0..MAX_PROBE.min(self.slots.len()) {
            let idx = (start + probe) & self.mask;
            match &self.slots[idx] {
                None => return None,
                Some((s, book_idx)) if s == symbol => return Some(*book_idx),
                _ => {}
            }
        }
        None
    }

    fn insert(&mut self, symbol: Symbol, book_idx: usize) -> Result<(), EngineError> {
        let start = (fnv1a(symbol.as_bytes()) as usize) & self.mask;
        for probe in 0..MAX_PROBE.min(self.slots.len()) {
            let idx = (start + probe) & self.mask;
            match &self.slots[idx] {
                None => {
                    self.slots[idx] = Some((symbol, book_idx));
                    self.len += 1;
                    return Ok(());
                }
                Some((s, _)) if s == &symbol => return Ok(()),
                _ => {}
            }
        }
        Err(EngineError::SymbolTableFull(self.len))
    }
}

/// Order-key → symbol map. Tracks which book a resting order lives in, so a
/// bare `(user_id, user_order_id)` cancel can find the right book without the
/// caller naming a symbol.
struct KeyIndex {
    keys: Vec<OrderKey>,
    symbols: Vec<Symbol>,
    mask: usize,
}

const EMPTY_KEY: OrderKey = 0;
const TOMBSTONE_KEY: OrderKey = OrderKey::MAX;

impl KeyIndex {
    fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.next_power_of_two();
        KeyIndex {
            keys: vec![EMPTY_KEY; cap],
            symbols: vec![Symbol::empty(); cap],
            mask: cap - 1,
        }
    }

    fn insert(&mut self, key: OrderKey, symbol: Symbol) -> Result<(), EngineError> {
        let start = (mix64(key) as usize) & self.mask;
        let mut first_tombstone = None;
        for probe in 0..MAX_PROBE.min(self.keys.len()) {
            let idx = (start + probe) & self.mask;
            match self.keys[idx] {
                EMPTY_KEY => {
                    let target = first_tombstone.unwrap_or(idx);
                    self.keys[target] = key;
                    self.symbols[target] = symbol;
                    return Ok(());
                }
                TOMBSTONE_KEY => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                k if k == key => {
                    self.symbols[idx] = symbol;
                    return Ok(());
                }
                _ => {}
            }
        }
        if let Some(idx) = first_tombstone {
            self.keys[idx] = key;
            self.symbols[idx] = symbol;
            return Ok(());
        }
        Err(EngineError::KeyIndexOverflow)
    }

    fn remove(&mut self, key: OrderKey) -> Option<Symbol> {
        let start = (mix64(key) as usize) & self.mask;
        for probe in 0..MAX_PROBE.min(self.keys.len()) {
            let idx = (start + probe) & self.mask;
            match self.keys[idx] {
                EMPTY_KEY => return None,
                k if k == key => {
                    let symbol = self.symbols[idx];
                    self.keys[idx] = TOMBSTONE_KEY;
                    return Some(symbol);
                }
                _ => {}
            }
        }
        None
    }

    fn clear(&mut self) {
        self.keys.fill(EMPTY_KEY);
        self.symbols.fill(Symbol::empty());
    }
}

pub struct MatchingEngine {
    pool: OrderPool,
    books: Vec<OrderBook>,
    symbols: Vec<Symbol>,
    symbol_table: SymbolTable,
    key_index: KeyIndex,
    max_symbols: usize,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_capacity(N_ORDERS, MAX_SYMBOLS)
    }

    pub fn with_capacity(pool_capacity: usize, symbol_capacity: usize) -> Self {
        let max_symbols = symbol_capacity.min(MAX_SYMBOLS);
        MatchingEngine {
            pool: OrderPool::new(pool_capacity),
            books: Vec::with_capacity(max_symbols),
            symbols: Vec::with_capacity(max_symbols),
            symbol_table: SymbolTable::with_capacity(512),
            key_index: KeyIndex::with_capacity(16_384),
            max_symbols,
        }
    }

    #[inline]
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    #[inline]
    pub fn pool(&self) -> &OrderPool {
        &self.pool
    }

    fn get_or_create_book(&mut self, symbol: Symbol) -> Result<usize, EngineError> {
        if let Some(idx) = self.symbol_table.find(&symbol) {
            return Ok(idx);
        }
        if self.books.len() >= self.max_symbols {
            return Err(EngineError::SymbolTableFull(self.books.len()));
        }
        let idx = self.books.len();
        self.books.push(OrderBook::new());
        self.symbols.push(symbol);
        self.symbol_table.insert(symbol, idx)?;
        Ok(idx)
    }

    /// Processes one input message, appending every produced `BookMsg`
    /// (labelled with its originating symbol) to `out`. `client_id` is the
    /// originating client from the input envelope (§4.8); it has no bearing
    /// on Cancel/Flush/MassCancel, which carry their own client identity.
    pub fn process(
        &mut self,
        client_id: ClientId,
        msg: InputMsg,
        out: &mut Vec<SymbolMsg>,
    ) -> Result<(), EngineError> {
        match msg {
            InputMsg::NewOrder {
                symbol,
                user_id,
                user_order_id,
                side,
                kind,
                price,
                quantity,
            } => {
                let book_idx = self.get_or_create_book(symbol)?;
                let mut raw = Vec::new();
                self.books[book_idx]
                    .add(
                        &mut self.pool,
                        user_id,
                        user_order_id,
                        side,
                        kind,
                        price,
                        quantity,
                        client_id,
                        &mut raw,
                    )
                    .map_err(EngineError::from)?;
                self.key_index
                    .insert(order_key(user_id, user_order_id), symbol)?;
                out.extend(raw.into_iter().map(|m| SymbolMsg { symbol, msg: m }));
                Ok(())
            }
            InputMsg::Cancel {
                user_id,
                user_order_id,
            } => {
                let key = order_key(user_id, user_order_id);
                match self.key_index.remove(key) {
                    Some(symbol) => {
                        let book_idx = self
                            .symbol_table
                            .find(&symbol)
                            .expect("key index referenced a symbol with no book");
                        let mut raw = Vec::new();
                        self.books[book_idx].cancel(
                            &mut self.pool,
                            user_id,
                            user_order_id,
                            &mut raw,
                        );
                        out.extend(raw.into_iter().map(|m| SymbolMsg { symbol, msg: m }));
                    }
                    None => out.push(SymbolMsg {
                        symbol: Symbol::empty(),
                        msg: BookMsg::CancelAck {
                            user_id,
                            user_order_id,
                        },
                    }),
                }
                Ok(())
            }
            InputMsg::Flush => {
                for (idx, book) in self.books.iter_mut().enumerate() {
                    let symbol = self.symbols[idx];
                    book.flush();
                    let mut raw = Vec::new();
                    while book.continue_flush(&mut self.pool, &mut raw) == FlushStatus::Continue {}
                    out.extend(raw.into_iter().map(|m| SymbolMsg { symbol, msg: m }));
                }
                self.key_index.clear();
                Ok(())
            }
            InputMsg::MassCancel { client_id } => {
                self.mass_cancel(client_id, out);
                Ok(())
            }
        }
    }

    /// Broadcasts a mass cancel to every book, in creation order, and
    /// returns the summed removed-order count across all of them (§4.5).
    pub fn mass_cancel(&mut self, client_id: ClientId, out: &mut Vec<SymbolMsg>) -> u32 {
        let mut total = 0u32;
        for (idx, book) in self.books.iter_mut().enumerate() {
            let symbol = self.symbols[idx];
            let mut raw = Vec::new();
            total += book.mass_cancel(&mut self.pool, client_id, &mut raw);
            out.extend(raw.into_iter().map(|m| SymbolMsg { symbol, msg: m }));
        }
        total
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
