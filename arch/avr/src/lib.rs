// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Generic support for 8-bit AVR cores.

#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]
#![no_std]

pub mod progmem;
pub mod support;

pub use crate::support::Avr;
