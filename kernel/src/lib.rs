// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Core serial transport kernel.
//!
//! The kernel crate holds the pieces shared by every architecture and chip
//! crate: the interrupt-safe byte ring buffer, the Hardware Interface Layer
//! (HIL) definition of a buffered byte stream and its line configuration,
//! the interface a CPU offers for masking interrupts, and the ambient
//! support (error codes, compile-time configuration, debug logging).
//!
//! Most `unsafe` code lives in the arch and chip crates, next to the
//! hardware it touches.

#![no_std]

pub mod collections;
pub mod config;
pub mod debug;
pub mod errorcode;
pub mod hil;
pub mod platform;
pub mod utilities;

pub use crate::errorcode::ErrorCode;
