//! C2 — per-book `(user_id, user_order_id) -> location` map. Open-addressed,
//! linear probing, inline entries only (no per-key allocation).

use crate::errors::OrderIndexError;
use crate::hash::mix64;
use crate::types::{OrderKey, Price, Side};

const EMPTY_KEY: OrderKey = 0;
const TOMBSTONE_KEY: OrderKey = OrderKey::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLocation {
    pub side: Side,
    pub price: Price,
    pub slot: u32,
}

#[derive(Clone, Copy)]
struct Entry {
    key: OrderKey,
    location: OrderLocation,
}

pub struct OrderIndex {
    entries: Vec<Option<Entry>>,
    mask: usize,
    len: usize,
    tombstones: usize,
}

impl OrderIndex {
    /// `capacity` is rounded up to the next power of two; callers should size
    /// it so the table's load factor stays at or below 0.5 under the
    /// documented maximum resting-order count.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.next_power_of_two().max(16);
        OrderIndex {
            entries: vec![None; cap],
            mask: cap - 1,
            len: 0,
            tombstones: 0,
        }
    }

    #[inline]
    fn slot_for(&self, key: OrderKey) -> usize {
        (mix64(key) as usize) & self.mask
    }

    fn tombstone_at(&self, idx: usize) -> bool {
        matches!(&self.entries[idx], Some(e) if e.key == TOMBSTONE_KEY)
    }

    pub fn insert(&mut self, key: OrderKey, location: OrderLocation) -> Result<(), OrderIndexError> {
        debug_assert!(key != EMPTY_KEY && key != TOMBSTONE_KEY);
        let start = self.slot_for(key);
        let mut first_tombstone: Option<usize> = None;
        for probe in 0..crate::types::MAX_PROBE {
            let idx = (start + probe) & self.mask;
            match &mut self.entries[idx] {
                None => {
                    let target = first_tombstone.unwrap_or(idx);
                    if first_tombstone.is_some() {
                        self.tombstones -= 1;
                    }
                    self.entries[target] = Some(Entry { key, location });
                    self.len += 1;
                    return Ok(());
                }
                Some(e) if e.key == TOMBSTONE_KEY => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                Some(e) if e.key == key => {
                    // Duplicate key: overwrite the location, matching the
                    // historical (undefined-per-spec) behaviour callers must
                    // not rely on.
                    e.location = location;
                    return Ok(());
                }
                Some(_) => {}
            }
        }
        if let Some(idx) = first_tombstone {
            self.entries[idx] = Some(Entry { key, location });
            self.tombstones -= 1;
            self.len += 1;
            return Ok(());
        }
        Err(OrderIndexError::ProbeOverflow(crate::types::MAX_PROBE))
    }

    pub fn find(&self, key: OrderKey) -> Option<OrderLocation> {
        let start = self.slot_for(key);
        for probe in 0..crate::types::MAX_PROBE {
            let idx = (start + probe) & self.mask;
            match &self.entries[idx] {
                None => return None,
                Some(e) if e.key == key => return Some(e.location),
                _ => {}
            }
        }
        None
    }

    pub fn remove(&mut self, key: OrderKey) -> Option<OrderLocation> {
        let start = self.slot_for(key);
        for probe in 0..crate::types::MAX_PROBE {
            let idx = (start + probe) & self.mask;
            match &self.entries[idx] {
                None => return None,
                Some(e) if e.key == key => {
                    let location = e.location;
                    self.entries[idx] = Some(Entry {
                        key: TOMBSTONE_KEY,
                        location,
                    });
                    self.len -= 1;
                    self.tombstones += 1;
                    if self.should_rehash() {
                        self.rehash();
                    }
                    return Some(location);
                }
                _ => {}
            }
        }
        None
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn should_rehash(&self) -> bool {
        self.tombstones * 4 > self.entries.len()
    }

    fn rehash(&mut self) {
        let live: Vec<Entry> = self
            .entries
            .drain(..)
            .flatten()
            .filter(|e| e.key != TOMBSTONE_KEY)
            .collect();
        let cap = self.entries_capacity();
        self.entries = vec![None; cap];
        self.mask = cap - 1;
        self.len = 0;
        self.tombstones = 0;
        for e in live {
            // Capacity was sized for the live set; this cannot fail in
            // practice, but propagating would require a fallible rehash path
            // the spec does not ask for. A failure here means the table was
            // undersized, which is the same class of fatal bug as any other
            // capacity exhaustion.
            self.insert(e.key, e.location)
                .expect("rehash must not exceed probe bound");
        }
    }

    fn entries_capacity(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entry. Used by `flush()`.
    pub fn clear(&mut self) {
        for e in self.entries.iter_mut() {
            *e = None;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    #[cfg(test)]
    pub fn tombstone_fraction(&self) -> f64 {
        self.tombstones as f64 / self.entries.len() as f64
    }
}
