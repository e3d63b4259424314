// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Helper functions for the AVR architecture.

use kernel::platform::chip::InterruptControl;

/// Data-space address of the status register.
#[cfg(any(doc, target_arch = "avr"))]
const SREG: *mut u8 = 0x5F as *mut u8;

/// Global interrupt enable bit of SREG.
#[cfg(any(doc, target_arch = "avr"))]
const SREG_I: u8 = 1 << 7;

/// Whether the global interrupt flag is set
#[cfg(any(doc, target_arch = "avr"))]
#[inline(always)]
pub fn interrupts_enabled() -> bool {
    unsafe { core::ptr::read_volatile(SREG) & SREG_I != 0 }
}

/// Atomic operation
///
/// Saves SREG, clears the global interrupt flag, runs `f` and writes the
/// saved SREG back, so nested calls keep interrupts disabled.
#[cfg(any(doc, target_arch = "avr"))]
pub unsafe fn atomic<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    use core::arch::asm;
    let sreg = core::ptr::read_volatile(SREG);
    // Also a compiler barrier: memory accesses in `f` stay inside.
    asm!("cli", options(nostack));

    let res = f();

    // Keep the accesses of `f` before the restore.
    asm!("", options(nostack));
    core::ptr::write_volatile(SREG, sreg);
    res
}

/// Whether the global interrupt flag is set (mock)
// Mock implementations for host builds.
#[cfg(not(any(doc, target_arch = "avr")))]
pub fn interrupts_enabled() -> bool {
    unimplemented!()
}

/// Atomic operation (mock)
#[cfg(not(any(doc, target_arch = "avr")))]
pub unsafe fn atomic<F, R>(_f: F) -> R
where
    F: FnOnce() -> R,
{
    unimplemented!()
}

/// Interrupt control of the running AVR core.
#[derive(Clone, Copy, Debug, Default)]
pub struct Avr;

impl InterruptControl for Avr {
    fn interrupts_enabled(&self) -> bool {
        interrupts_enabled()
    }

    fn atomic<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // Masking interrupts on a single core cannot break memory safety.
        unsafe { atomic(f) }
    }
}
