// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Kernel debug output over a serial port.
//!
//! Drivers report through the `log` facade (`log::info!` and friends).
//! Firmware that wants to see those messages routes them to a UART by
//! installing a [`DebugWriter`] once at startup:
//!
//! ```rust,ignore
//! static CONSOLE: DebugWriter<'static, Usart<'static, Avr>> = DebugWriter::new(&USART0);
//!
//! USART0.begin(115200)?;
//! unsafe { kernel::debug::install(&CONSOLE, log::LevelFilter::Info)? };
//! ```
//!
//! Each record is written as one line, `[LEVEL] target: message\r\n`. Output
//! goes through [`ByteStream::write`], so it blocks when the transmit buffer
//! is full, and is silently discarded while the port is not active. Nothing
//! may log from an interrupt handler.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};

use crate::hil::uart::{ByteStream, StreamWriter};
use crate::ErrorCode;

/// A `log` sink writing to a [`ByteStream`].
pub struct DebugWriter<'a, S: ByteStream + ?Sized> {
    port: &'a S,
}

impl<'a, S: ByteStream + ?Sized> DebugWriter<'a, S> {
    pub const fn new(port: &'a S) -> DebugWriter<'a, S> {
        DebugWriter { port }
    }

    fn write_record(&self, record: &Record) -> core::fmt::Result {
        let mut out = StreamWriter(self.port);
        write!(
            out,
            "[{}] {}: {}\r\n",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl<S: ByteStream + Sync + ?Sized> Log for DebugWriter<'_, S> {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        self.port.is_active()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // A short write means the port was shut down mid-line.
        let _ = self.write_record(record);
    }

    fn flush(&self) {
        if self.port.is_active() {
            self.port.flush();
        }
    }
}

/// Make `writer` the global logger and set the maximum level logged.
///
/// Returns `Err(ErrorCode::ALREADY)` if a logger has been installed before.
///
/// ## Safety
///
/// Must not run concurrently with another logger installation or with any
/// logging call, i.e. call it from the foreground during startup.
pub unsafe fn install<S>(
    writer: &'static DebugWriter<'static, S>,
    level: LevelFilter,
) -> Result<(), ErrorCode>
where
    S: ByteStream + Sync + ?Sized + 'static,
{
    log::set_logger_racy(writer).map_err(|_| ErrorCode::ALREADY)?;
    log::set_max_level_racy(level);
    Ok(())
}
