// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Implementation of a byte ring buffer shared with an interrupt handler.
//!
//! The buffer has exactly one producer and one consumer, which may run in
//! different execution contexts (foreground code and an interrupt handler).
//! The producer only ever stores `head` and the consumer only ever stores
//! `tail`, each with a single byte-wide atomic store, so neither side needs
//! to mask interrupts to push or pop.
//!
//! Indices run freely modulo 256 and are reduced modulo `N` to address the
//! storage. `head == tail` is the empty buffer and `head - tail == N` the full
//! one, which is why `N` must be a power of two no larger than 128.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

pub struct RingBuffer<const N: usize> {
    ring: UnsafeCell<[u8; N]>,
    /// Next free slot. Written by the producer only.
    head: AtomicU8,
    /// Next unread slot. Written by the consumer only.
    tail: AtomicU8,
}

// Safety: a slot is written by the producer strictly before `head` is
// published past it, and read by the consumer strictly before `tail` is
// published past it, so the two sides never touch the same slot at the same
// time.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const VALID_CAPACITY: () = assert!(
        N.is_power_of_two() && N <= 128,
        "ring buffer capacity must be a power of two no larger than 128"
    );

    pub const fn new() -> RingBuffer<N> {
        let () = Self::VALID_CAPACITY;
        RingBuffer {
            ring: UnsafeCell::new([0; N]),
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
        }
    }

    /// Maximum number of bytes the buffer holds.
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    fn slot(index: u8) -> usize {
        usize::from(index) & (N - 1)
    }

    #[inline]
    fn count(head: u8, tail: u8) -> usize {
        usize::from(head.wrapping_sub(tail))
    }

    /// Number of unread bytes.
    ///
    /// Reads both indices. If the other side may be running concurrently the
    /// result is a lower bound (consumer side) or an upper bound (producer
    /// side); callers needing an exact snapshot mask interrupts around the
    /// call.
    pub fn len(&self) -> usize {
        Self::count(
            self.head.load(Ordering::Acquire),
            self.tail.load(Ordering::Acquire),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Returns the number of bytes that can be pushed until the buffer is
    /// full.
    pub fn available_len(&self) -> usize {
        N - self.len()
    }

    /// Append `byte`. Producer side.
    ///
    /// Returns `false`, leaving the contents untouched, if the buffer is
    /// full; the byte is dropped.
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if Self::count(head, tail) == N {
            return false;
        }
        unsafe {
            self.ring.get().cast::<u8>().add(Self::slot(head)).write(byte);
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Remove and return the oldest byte. Consumer side.
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        let byte = self.read_at(tail)?;
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Return the oldest byte without removing it. Consumer side.
    pub fn peek(&self) -> Option<u8> {
        self.read_at(self.tail.load(Ordering::Relaxed))
    }

    fn read_at(&self, tail: u8) -> Option<u8> {
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        Some(unsafe { self.ring.get().cast::<u8>().add(Self::slot(tail)).read() })
    }

    /// Discard every unread byte by moving `tail` up to `head`.
    ///
    /// This stores the consumer index from whatever context calls it, so the
    /// consumer must not be running concurrently (for a buffer drained by an
    /// interrupt handler, call it with that interrupt masked or disabled).
    pub fn empty(&self) {
        self.tail
            .store(self.head.load(Ordering::Acquire), Ordering::Release);
    }
}
