// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Utility types and re-exports provided by the kernel crate.

pub mod program_space;

mod static_ref;
pub use self::static_ref::StaticRef;

/// The Tock Register Interface.
///
/// This is a re-export of the `tock-registers` crate provided for
/// convenience, so chip crates describe their memory-mapped registers
/// without depending on it directly.
pub mod registers {
    pub use tock_registers::interfaces;
    pub use tock_registers::registers::ReadWrite;
    pub use tock_registers::{register_bitfields, register_structs};
}
