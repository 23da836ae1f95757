// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded SPSC ring for the event queue.
//!
//! # Protocol
//!
//! Monotonic `u32` head (producer-owned) and tail (consumer-owned). The
//! producer writes the slot first, then publishes the advanced head with
//! release semantics; the consumer acquires the head, reads the slot, then
//! publishes the advanced tail with release semantics so the producer's
//! fullness check sees the slot free before reusing it. One slot stays in
//! reserve, so at most `capacity − 1` events are queued at once.
//!
//! Items are `Copy`, so slots never own anything that needs dropping and
//! overflow can simply report full and discard the new item at the caller.
#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::CachePadded;

/// Bounded single-producer/single-consumer ring buffer.
pub(crate) struct SpscRing<T: Copy> {
    head: CachePadded<AtomicU32>,
    tail: CachePadded<AtomicU32>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: the head/tail handoff above makes producer writes and consumer
// reads of any given slot disjoint in time; `T: Copy + Send` carries no
// ownership across the boundary.
unsafe impl<T: Copy + Send> Send for SpscRing<T> {}
unsafe impl<T: Copy + Send> Sync for SpscRing<T> {}

impl<T: Copy> SpscRing<T> {
    /// Creates a ring with room for `capacity − 1` simultaneous items.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Self {
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            slots,
        }
    }

    fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Pushes an item. Producer-only (the simulation thread).
    ///
    /// # Errors
    /// Hands the item back when the queue is full; the caller accounts for
    /// the drop.
    pub fn push(&self, value: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= self.capacity() - 1 {
            return Err(value);
        }
        // SAFETY: only this producer writes slots, and the fullness check
        // just confirmed the consumer has moved past this slot's last lap.
        unsafe {
            (*self.slots[(head % self.capacity()) as usize].get()).write(value);
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Pops the next item. Consumer-only (the claimed event receiver).
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        // SAFETY: the acquire load of `head` ordered the producer's slot
        // write before this read, and only this consumer reads slots.
        let value = unsafe { (*self.slots[(tail % self.capacity()) as usize].get()).assume_init_read() };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fifo_and_fullness() {
        let ring = SpscRing::new(4);
        assert_eq!(ring.pop(), None);
        ring.push(10u32).unwrap();
        ring.push(11).unwrap();
        ring.push(12).unwrap();
        assert_eq!(ring.push(13), Err(13));
        assert_eq!(ring.pop(), Some(10));
        assert_eq!(ring.pop(), Some(11));
        ring.push(13).unwrap();
        assert_eq!(ring.pop(), Some(12));
        assert_eq!(ring.pop(), Some(13));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn cross_thread_stream_preserves_order() {
        const COUNT: u32 = 100_000;
        let ring = Arc::new(SpscRing::new(128));

        let producer = {
            let ring = Arc::clone(&ring);
            std::thread::spawn(move || {
                for i in 0..COUNT {
                    while ring.push(i).is_err() {
                        std::thread::yield_now();
                    }
                }
            })
        };

        let mut expected = 0;
        while expected < COUNT {
            if let Some(got) = ring.pop() {
                assert_eq!(got, expected);
                expected += 1;
            } else {
                std::thread::yield_now();
            }
        }
        producer.join().unwrap();
        assert_eq!(ring.pop(), None);
    }
}
