//! C6 — the fixed-capacity SPSC ring queue connecting ingress/worker/egress
//! stages. One producer, one consumer, no locks, no hot-path allocation: the
//! backing array is allocated once at construction and never resized.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache-line padding so producer-owned `tail` and consumer-owned `head`
/// never share a line (false-sharing would otherwise bounce both cores'
/// caches on every enqueue/dequeue).
#[repr(align(64))]
struct PaddedCounter(AtomicUsize);

/// Single-producer single-consumer bounded queue. `capacity` is the physical
/// array size (rounded up to a power of two); one slot is always left empty
/// to distinguish full from empty without a separate count, so usable
/// capacity is one less than the physical size.
pub struct SpscRing<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    head: PaddedCounter,
    tail: PaddedCounter,
}

// SAFETY: the SPSC protocol (one producer thread calling `enqueue`, one
// consumer thread calling `dequeue`) is the caller's responsibility; the
// acquire/release pairing below is what makes sharing `&SpscRing<T>` across
// those two threads sound for `T: Send`.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    pub fn new(capacity: usize) -> Self {
        let physical = capacity.next_power_of_two().max(2);
        let buffer = (0..physical)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        SpscRing {
            buffer,
            mask: physical - 1,
            head: PaddedCounter(AtomicUsize::new(0)),
            tail: PaddedCounter(AtomicUsize::new(0)),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Enqueues `item`. Returns `false` (and drops nothing — `item` is
    /// returned to the caller via the bool being false, the value itself
    /// was never moved in) if the ring is full.
    pub fn enqueue(&self, item: T) -> bool {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Relaxed);
        let next = (tail + 1) & self.mask;
        if next == head {
            return false;
        }
        unsafe {
            (*self.buffer[tail].get()).write(item);
        }
        self.tail.0.store(next, Ordering::Release);
        true
    }

    pub fn dequeue(&self) -> Option<T> {
        let tail = self.tail.0.load(Ordering::Acquire);
        let head = self.head.0.load(Ordering::Relaxed);
        if head == tail {
            return None;
        }
        let item = unsafe { (*self.buffer[head].get()).assume_init_read() };
        let next = (head + 1) & self.mask;
        self.head.0.store(next, Ordering::Release);
        Some(item)
    }

    /// Dequeues up to `max` items into `out`, preserving FIFO order. Returns
    /// the number dequeued.
    pub fn dequeue_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut n = 0;
        while n < max {
            match self.dequeue() {
                Some(item) => {
                    out.push(item);
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Approximate occupancy: correct if read by the owning producer or
    /// consumer thread, advisory if read by a third party.
    pub fn len(&self) -> usize {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Relaxed);
        tail.wrapping_sub(head) & self.mask
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_dequeue_roundtrip_preserves_order() {
        let ring: SpscRing<u32> = SpscRing::new(8);
        assert!(ring.enqueue(1));
        assert!(ring.enqueue(2));
        assert!(ring.enqueue(3));
        assert_eq!(ring.dequeue(), Some(1));
        assert_eq!(ring.dequeue(), Some(2));
        assert_eq!(ring.dequeue(), Some(3));
        assert_eq!(ring.dequeue(), None);
    }

    #[test]
    fn full_ring_rejects_and_leaves_queue_intact() {
        let ring: SpscRing<u32> = SpscRing::new(4);
        assert_eq!(ring.capacity(), 3);
        assert!(ring.enqueue(1));
        assert!(ring.enqueue(2));
        assert!(ring.enqueue(3));
        assert!(!ring.enqueue(4), "one slot is always reserved empty");
        assert!(ring.is_full());
        assert_eq!(ring.dequeue(), Some(1));
        assert!(ring.enqueue(4));
    }

    #[test]
    fn dequeue_batch_respects_max_and_fifo() {
        let ring: SpscRing<u32> = SpscRing::new(16);
        for i in 0..10 {
            assert!(ring.enqueue(i));
        }
        let mut out = Vec::new();
        let n = ring.dequeue_batch(&mut out, 4);
        assert_eq!(n, 4);
        assert_eq!(out, vec![0, 1, 2, 3]);
        let n2 = ring.dequeue_batch(&mut out, 100);
        assert_eq!(n2, 6);
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn drop_runs_destructors_for_remaining_items() {
        use std::sync::atomic::AtomicU32;
        use std::sync::Arc;

        struct Counted(Arc<AtomicU32>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let counter = Arc::new(AtomicU32::new(0));
        {
            let ring: SpscRing<Counted> = SpscRing::new(4);
            ring.enqueue(Counted(counter.clone()));
            ring.enqueue(Counted(counter.clone()));
        }
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    proptest::proptest! {
        #[test]
        fn len_always_matches_occupancy_and_stays_under_capacity(
            ops in proptest::collection::vec(proptest::bool::ANY, 1..500)
        ) {
            let ring: SpscRing<u32> = SpscRing::new(8);
            let mut model: std::collections::VecDeque<u32> = std::collections::VecDeque::new();
            let mut next = 0u32;
            for enqueue_not_dequeue in ops {
                if enqueue_not_dequeue {
                    if ring.enqueue(next) {
                        model.push_back(next);
                        next += 1;
                    }
                } else {
                    let expected = model.pop_front();
                    assert_eq!(ring.dequeue(), expected);
                }
                assert_eq!(ring.len(), model.len());
                assert!(ring.len() < ring.capacity() + 1);
            }
        }
    }
}
