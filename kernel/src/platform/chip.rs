// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interface for controlling the global interrupt flag of an MCU.

/// Global interrupt control.
///
/// Drivers that share state with their own interrupt handlers take an
/// implementation of this trait instead of touching the CPU directly. This
/// lets a driver detect that it is running with interrupts disabled (inside
/// an interrupt handler, or inside a critical section) and service its
/// hardware by polling instead of waiting for an interrupt that cannot fire.
pub trait InterruptControl {
    /// Whether the CPU currently accepts interrupts.
    fn interrupts_enabled(&self) -> bool;

    /// Run `f` with interrupts disabled, then restore the previous interrupt
    /// state. Nests: an inner call leaves interrupts disabled on exit if they
    /// were disabled on entry.
    fn atomic<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R;
}
