// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Constant strings kept in flash.
//!
//! AVR flash is a separate address space, read with the `lpm` instruction.
//! [`progmem_str!`](crate::progmem_str) places a NUL-terminated literal in
//! the `.progmem.data` section and returns a [`ProgmemStr`] handle to it;
//! [`Flash`] reads it back one byte at a time.
//!
//! ```rust,ignore
//! USART0.print_program_string(avr::progmem_str!("ready\r\n"));
//! ```
//!
//! `lpm` addresses the low 64 KiB of flash only; the linker places
//! `.progmem.data` right after the vector table.
//!
//! On other targets the section attribute is dropped and the bytes live in
//! ordinary memory, so the same code runs in host tests.

use kernel::utilities::program_space::ProgramSpace;

/// Reader for the AVR program memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flash;

impl ProgramSpace for Flash {
    #[cfg(target_arch = "avr")]
    #[inline(always)]
    unsafe fn read_byte(&self, addr: *const u8) -> u8 {
        use core::arch::asm;
        let byte: u8;
        asm!(
            "lpm {}, Z",
            out(reg) byte,
            in("Z") addr,
            options(pure, readonly, nostack, preserves_flags)
        );
        byte
    }

    #[cfg(not(target_arch = "avr"))]
    unsafe fn read_byte(&self, addr: *const u8) -> u8 {
        addr.read()
    }
}

/// Handle to a NUL-terminated string in program memory.
#[derive(Clone, Copy, Debug)]
pub struct ProgmemStr {
    ptr: *const u8,
}

impl ProgmemStr {
    /// ## Safety
    ///
    /// `ptr` must be the program-memory address of a NUL-terminated byte
    /// string that lives for the rest of the program.
    pub const unsafe fn from_raw(ptr: *const u8) -> ProgmemStr {
        ProgmemStr { ptr }
    }

    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr
    }
}

/// `s` followed by a NUL byte. `N` must be `s.len() + 1` and `s` must not
/// contain NUL itself; both are checked at compile time when used in a
/// `static` initializer.
pub const fn nul_terminated<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    assert!(bytes.len() + 1 == N, "buffer must hold the string and a NUL");
    let mut out = [0u8; N];
    let mut i = 0;
    while i < bytes.len() {
        assert!(bytes[i] != 0, "string contains a NUL byte");
        out[i] = bytes[i];
        i += 1;
    }
    out
}

/// Store a string literal in program memory and evaluate to its
/// [`ProgmemStr`](crate::progmem::ProgmemStr).
#[macro_export]
macro_rules! progmem_str {
    ($s:literal) => {{
        const LEN: usize = $s.len() + 1;
        #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
        static BYTES: [u8; LEN] = $crate::progmem::nul_terminated::<LEN>($s);
        // Safety: BYTES is a static NUL-terminated string in program memory.
        unsafe { $crate::progmem::ProgmemStr::from_raw(BYTES.as_ptr()) }
    }};
}

#[cfg(test)]
mod tests {
    use super::{nul_terminated, Flash, ProgmemStr};
    use kernel::utilities::program_space::ProgramSpace;

    fn read_all(s: ProgmemStr, out: &mut [u8]) -> usize {
        let mut n = 0;
        loop {
            let byte = unsafe { Flash.read_byte(s.as_ptr().add(n)) };
            if byte == 0 {
                return n;
            }
            out[n] = byte;
            n += 1;
        }
    }

    #[test]
    fn appends_terminator() {
        const BYTES: [u8; 4] = nul_terminated::<4>("abc");
        assert_eq!(BYTES, *b"abc\0");
        assert_eq!(nul_terminated::<1>(""), [0]);
    }

    #[test]
    fn macro_places_readable_string() {
        let s = crate::progmem_str!("Hello, AVR");
        let mut out = [0u8; 16];
        let n = read_all(s, &mut out);
        assert_eq!(&out[..n], b"Hello, AVR");
    }

    #[test]
    fn each_use_gets_its_own_storage() {
        let a = crate::progmem_str!("one");
        let b = crate::progmem_str!("two");
        assert_ne!(a.as_ptr(), b.as_ptr());

        let mut out = [0u8; 4];
        let n = read_all(b, &mut out);
        assert_eq!(&out[..n], b"two");
    }
}
