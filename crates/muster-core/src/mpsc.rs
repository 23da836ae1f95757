// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded lock-free MPSC ring for the command queue.
//!
//! # Protocol
//!
//! Head and tail are monotonic `u32` tickets; a ticket's slot is
//! `ticket % capacity`. Producers CAS the head to reserve a ticket, write
//! the value into the reserved slot, then publish the slot's sequence stamp
//! (`ticket + 1`) with release semantics. The consumer owns the tail: it
//! reads the next slot's stamp with acquire semantics — a reserved but
//! not-yet-written slot simply reads as "not ready" — moves the value out,
//! and publishes the advanced tail with release semantics so producers'
//! fullness checks observe the consumption before reusing the slot.
//!
//! Fullness keeps one slot in reserve (`head − tail == capacity − 1` is
//! full), so at most `capacity − 1` items are ever enqueued at once.
//!
//! FIFO across producers is not guaranteed (ticket order is CAS race
//! order); pushes from a single producer are consumed in program order.
//!
//! # Single-writer invariants
//!
//! - `tail` is written only by the consumer (the tick loop); producers only
//!   read it for the fullness check.
//! - A slot's value is written only by the producer holding its ticket and
//!   read only by the consumer after the stamp matches; the stamp handoff
//!   plus the fullness window make those accesses disjoint in time.
#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::CachePadded;

struct Slot<T> {
    /// Stamp `ticket + 1` once the value for `ticket` is readable.
    seq: AtomicU32,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded many-producer/single-consumer ring buffer.
pub(crate) struct MpscRing<T> {
    head: CachePadded<AtomicU32>,
    tail: CachePadded<AtomicU32>,
    slots: Box<[Slot<T>]>,
}

// SAFETY: slots are handed between threads through the stamp/tail protocol
// above; a value is owned by exactly one side at any instant.
unsafe impl<T: Send> Send for MpscRing<T> {}
unsafe impl<T: Send> Sync for MpscRing<T> {}

impl<T> MpscRing<T> {
    /// Creates a ring with room for `capacity − 1` simultaneous items.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        let slots = (0..capacity)
            .map(|_| Slot {
                seq: AtomicU32::new(0),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
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

    /// Pushes a value from any producer thread.
    ///
    /// # Errors
    /// Returns the value back when the queue is full; the caller decides
    /// whether and when to retry.
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            if head.wrapping_sub(tail) >= self.capacity() - 1 {
                return Err(value);
            }
            match self.head.compare_exchange_weak(
                head,
                head.wrapping_add(1),
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => head = current,
            }
        }

        let slot = &self.slots[(head % self.capacity()) as usize];
        // SAFETY: the CAS above granted this producer exclusive ownership of
        // ticket `head`; the consumer will not touch the slot until the
        // stamp below is published, and no other producer can hold the same
        // ticket within one `u32` lap.
        unsafe {
            (*slot.value.get()).write(value);
        }
        slot.seq.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Pops the next value.
    ///
    /// Consumer-only: exactly one thread (the tick loop) may call this. The
    /// stamp check subsumes the head comparison — an unstamped slot reads as
    /// empty even if the head has already advanced past it.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = &self.slots[(tail % self.capacity()) as usize];
        if slot.seq.load(Ordering::Acquire) != tail.wrapping_add(1) {
            return None;
        }
        // SAFETY: the acquire load above observed this ticket's stamp, so
        // the producer's write to the slot happens-before this read, and the
        // slot holds an initialized value that no one else will read (single
        // consumer). Producers cannot overwrite it until the tail store
        // below moves the fullness window past this ticket.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}

impl<T> Drop for MpscRing<T> {
    fn drop(&mut self) {
        // Owned values still in the ring must be dropped in place.
        while self.pop().is_some() {}
    }
}
