//! Core data model: symbols, orders, price levels, and the capacity constants
//! every other module is sized against.

/// Maximum byte length of a symbol.
pub const SYMBOL_MAX_LEN: usize = 16;
/// Maximum number of distinct symbols (books) a single engine instance holds.
pub const MAX_SYMBOLS: usize = 256;
/// Maximum resting price levels per side, per book.
pub const L_MAX: usize = 10_000;
/// Orders pre-allocated in one worker's pool.
pub const N_ORDERS: usize = 10_000;
/// Linear-probe bound for open-addressed tables before an insert fails fatally.
pub const MAX_PROBE: usize = 128;
/// Output messages a single book operation may emit before later ones are dropped.
pub const MAX_OUTPUT_MSGS: usize = 4_096;
/// CancelAcks emitted per `continue_flush` batch.
pub const FLUSH_BATCH_SIZE: usize = 256;
/// Defensive cap on matching-loop iterations for a single `add`.
pub const MAX_MATCH_ITERATIONS: usize = 1_000_000;
/// SPSC ring queue capacity (power of two).
pub const RING_CAPACITY: usize = 65_536;
/// Consecutive empty polls before a worker backs off from 1us to 100us sleeps.
pub const IDLE_THRESHOLD: u32 = 1_000;
/// Input envelopes pulled per worker loop iteration.
pub const BATCH_SIZE: usize = 32;

/// Sentinel "no slot" value for intrusive list links and index results.
pub const NULL_SLOT: u32 = u32::MAX;

pub type UserId = u32;
pub type UserOrderId = u32;
pub type Price = u32;
pub type Quantity = u32;
pub type ClientId = u32;

/// `(user_id << 32) | user_order_id`, unique per resting order at a point in time.
pub type OrderKey = u64;

#[inline]
pub const fn order_key(user_id: UserId, user_order_id: UserOrderId) -> OrderKey {
    ((user_id as u64) << 32) | user_order_id as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

/// Fixed-capacity symbol buffer so books and maps never allocate per-symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    bytes: [u8; SYMBOL_MAX_LEN],
    len: u8,
}

impl Symbol {
    pub fn new(raw: &[u8]) -> Option<Self> {
        if raw.is_empty() || raw.len() > SYMBOL_MAX_LEN {
            return None;
        }
        let mut bytes = [0u8; SYMBOL_MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Symbol {
            bytes,
            len: raw.len() as u8,
        })
    }

    /// The empty symbol used when a CancelAck's originating book is unknown.
    pub const fn empty() -> Self {
        Symbol {
            bytes: [0u8; SYMBOL_MAX_LEN],
            len: 0,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resting (or in-flight) order. Cache-line sized so the hot matching path
/// never straddles a line boundary.
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub user_id: UserId,
    pub user_order_id: UserOrderId,
    pub client_id: ClientId,
    pub price: Price,
    pub original_qty: Quantity,
    pub remaining_qty: Quantity,
    pub timestamp: u64,
    pub side: Side,
    pub kind: OrderType,
    /// Intrusive doubly-linked FIFO links: pool slot indices, `NULL_SLOT` for none.
    pub prev: u32,
    pub next: u32,
    _pad: [u8; 18],
}

impl Default for Order {
    fn default() -> Self {
        Order {
            user_id: 0,
            user_order_id: 0,
            client_id: 0,
            price: 0,
            original_qty: 0,
            remaining_qty: 0,
            timestamp: 0,
            side: Side::Buy,
            kind: OrderType::Limit,
            prev: NULL_SLOT,
            next: NULL_SLOT,
            _pad: [0; 18],
        }
    }
}

impl Order {
    #[inline]
    pub fn key(&self) -> OrderKey {
        order_key(self.user_id, self.user_order_id)
    }
}

const _: () = assert!(std::mem::size_of::<Order>() <= 64);

/// A single price level: total resting quantity and the intrusive FIFO of
/// orders resting at this price, addressed by pool slot.
#[derive(Debug, Clone, Copy)]
pub struct PriceLevel {
    pub price: Price,
    pub total_qty: u64,
    pub head: u32,
    pub tail: u32,
    pub active: bool,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        PriceLevel {
            price,
            total_qty: 0,
            head: NULL_SLOT,
            tail: NULL_SLOT,
            active: true,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == NULL_SLOT
    }
}
