// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Peripheral implementations for the ATmega2560 MCU.

#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]
#![no_std]

pub mod baud;
#[cfg(target_arch = "avr")]
pub mod interrupts;
pub mod usart;

/// Frequency of the CPU clock, which also clocks the USARTs.
pub const CPU_FREQUENCY_HZ: u32 = 16_000_000;
