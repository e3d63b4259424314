// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Emitting strings stored outside the data address space.
//!
//! On Harvard-architecture MCUs constant strings can be kept in program
//! memory, which is not reachable through ordinary loads. A
//! [`ProgramSpace`] reads one byte at a time from such a space and
//! [`write_program_str`] streams a NUL-terminated string from it to a
//! [`ByteStream`].

use crate::hil::uart::ByteStream;

/// Byte-wise read access to an address space that ordinary pointer
/// dereferences cannot reach.
pub trait ProgramSpace {
    /// Read the byte at `addr`.
    ///
    /// ## Safety
    ///
    /// `addr` must be a valid address in this space.
    unsafe fn read_byte(&self, addr: *const u8) -> u8;
}

/// Write the NUL-terminated string at `addr` in `space` to `port`.
///
/// Every byte up to, but not including, the first NUL is passed to
/// [`ByteStream::write`]. Returns the number of bytes the port accepted.
///
/// ## Safety
///
/// `addr` must point to a NUL-terminated byte string in `space`.
pub unsafe fn write_program_str<S, P>(port: &S, space: &P, addr: *const u8) -> usize
where
    S: ByteStream + ?Sized,
    P: ProgramSpace + ?Sized,
{
    let mut written = 0;
    let mut cursor = addr;
    loop {
        let byte = space.read_byte(cursor);
        if byte == 0 {
            break;
        }
        written += port.write(byte);
        cursor = cursor.add(1);
    }
    written
}
