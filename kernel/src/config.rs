// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Data structure for storing compile-time configuration options.
//!
//! Configuration is a typed `const` object rather than scattered
//! `#[cfg(feature = ...)]` attributes. Every code path stays type-checked
//! regardless of which options are enabled, and the compiler folds the
//! constant conditions away, so a disabled option costs nothing in the
//! resulting image.
//!
//! Cargo features only feed the values of [`CONFIG`]; this is the only place
//! in the workspace where `cfg!(feature = ...)` is consulted.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching cargo feature of the
/// kernel crate.
pub struct Config {
    /// Whether `begin` should log the divisor and double-speed setting it
    /// selected for the requested baud rate.
    ///
    /// The message is emitted at `debug` level through the `log` facade, so a
    /// logger must also be installed (see [`crate::debug`]).
    pub trace_line_config: bool,

    /// Whether the receive interrupt handler counts bytes dropped because the
    /// RX ring buffer was full.
    ///
    /// The counter is a single byte updated by the interrupt handler only; the
    /// foreground reads and clears it. Disabling it removes one load and one
    /// store from the overflow branch of the handler.
    pub count_rx_overruns: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined.
pub const CONFIG: Config = Config {
    trace_line_config: cfg!(feature = "trace_line_config"),
    count_rx_overruns: !cfg!(feature = "no_rx_overrun_counter"),
};
