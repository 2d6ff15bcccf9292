//! C1 — fixed-capacity order slab. Allocation and release are index
//! operations only; the pool never grows and never moves a live order.

use crate::errors::PoolError;
use crate::types::{Order, NULL_SLOT};

pub struct OrderPool {
    slots: Vec<Order>,
    live: Vec<bool>,
    free_list: Vec<u32>,
    pub total_allocations: u64,
    pub peak_usage: u64,
    pub allocation_failures: u64,
}

impl OrderPool {
    pub fn new(capacity: usize) -> Self {
        let mut free_list = Vec::with_capacity(capacity);
        // Push in descending order so slot 0 is handed out first.
        for slot in (0..capacity as u32).rev() {
            free_list.push(slot);
        }
        OrderPool {
            slots: vec![Order::default(); capacity],
            live: vec![false; capacity],
            free_list,
            total_allocations: 0,
            peak_usage: 0,
            allocation_failures: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Allocates a zeroed slot, returning its index.
    pub fn alloc(&mut self) -> Result<u32, PoolError> {
        match self.free_list.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Order::default();
                self.live[slot as usize] = true;
                self.total_allocations += 1;
                self.peak_usage = self.peak_usage.max(self.live_count() as u64);
                Ok(slot)
            }
            None => {
                self.allocation_failures += 1;
                Err(PoolError::OutOfCapacity(self.slots.len()))
            }
        }
    }

    /// Returns a slot to the free list. Double-free is a fatal invariant
    /// violation: the caller is the sole owner of the slot's lifetime.
    pub fn free(&mut self, slot: u32) {
        let idx = slot as usize;
        assert!(
            self.live[idx],
            "double free of order pool slot {slot}: invariant violated"
        );
        self.live[idx] = false;
        self.slots[idx].prev = NULL_SLOT;
        self.slots[idx].next = NULL_SLOT;
        self.free_list.push(slot);
    }

    #[inline]
    pub fn get(&self, slot: u32) -> &Order {
        &self.slots[slot as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> &mut Order {
        &mut self.slots[slot as usize]
    }

    #[inline]
    pub fn is_live(&self, slot: u32) -> bool {
        self.live[slot as usize]
    }
}
