// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! USART baud rate generator settings.
//!
//! The baud rate generator divides the peripheral clock by `UBRR + 1` and
//! then by 16, or by 8 when the U2X (double speed) bit is set:
//!
//! ```text
//! baud = f_clk / (16 * (UBRR + 1))    normal mode
//! baud = f_clk / (8 * (UBRR + 1))     double speed
//! ```
//!
//! UBRR is 12 bits wide.

use kernel::ErrorCode;

/// Largest value of the 12-bit UBRR register.
const UBRR_MAX: u32 = 4095;

/// Largest accepted deviation of the generated rate, in 1/20ths (5 %).
const TOLERANCE_DIVISOR: u64 = 20;

/// A divisor and speed mode producing a requested baud rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudSetting {
    pub ubrr: u16,
    pub double_speed: bool,
}

impl BaudSetting {
    /// Find the register setting for `baud` given a peripheral clock of
    /// `clock` Hz.
    ///
    /// Double speed is preferred because it halves the rounding error at
    /// high rates. Normal mode is used when the double speed divisor does
    /// not fit in 12 bits, and for 57600 baud on a 16 MHz clock, where normal
    /// mode is what the common bootloaders use and the error is the same.
    pub fn compute(clock: u32, baud: u32) -> Result<BaudSetting, ErrorCode> {
        if baud == 0 {
            return Err(ErrorCode::INVAL);
        }

        // Rounded `clock / (8 * baud) - 1`.
        let double = Self::divisor(clock / 4, baud).ok_or(ErrorCode::INVAL)?;
        let setting = if double > UBRR_MAX || (clock == 16_000_000 && baud == 57600) {
            let normal = Self::divisor(clock / 8, baud).ok_or(ErrorCode::INVAL)?;
            if normal > UBRR_MAX {
                return Err(ErrorCode::SIZE);
            }
            BaudSetting {
                ubrr: normal as u16,
                double_speed: false,
            }
        } else {
            BaudSetting {
                ubrr: double as u16,
                double_speed: true,
            }
        };

        let actual = u64::from(setting.actual_rate(clock));
        let baud = u64::from(baud);
        if actual.abs_diff(baud) * TOLERANCE_DIVISOR > baud {
            return Err(ErrorCode::INVAL);
        }
        Ok(setting)
    }

    fn divisor(scaled_clock: u32, baud: u32) -> Option<u32> {
        (scaled_clock / baud).checked_sub(1).map(|d| d / 2)
    }

    /// The baud rate this setting generates from a `clock` Hz clock.
    pub fn actual_rate(&self, clock: u32) -> u32 {
        let prescale = if self.double_speed { 8 } else { 16 };
        clock / (prescale * (u32::from(self.ubrr) + 1))
    }

    /// High byte of the divisor (UBRRnH).
    pub fn high(&self) -> u8 {
        (self.ubrr >> 8) as u8
    }

    /// Low byte of the divisor (UBRRnL).
    pub fn low(&self) -> u8 {
        self.ubrr as u8
    }
}
