// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Hardware interface layer (HIL) traits for buffered UART communication.
//!
//! A UART implementing [`ByteStream`] owns a receive and a transmit buffer
//! and moves bytes between them and the hardware from its interrupt
//! handlers. Callers never wait for input: [`ByteStream::read`] returns
//! `None` when nothing has arrived. Output is never dropped:
//! [`ByteStream::write`] waits for room in the transmit buffer if it has to.

use core::fmt;

use crate::ErrorCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 1,
    Two = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

/// Number of data bits per frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

/// Per-byte wire encoding: data bits, parity and stop bits.
///
/// A frame format can also be carried as a single discrete byte, see
/// [`FrameFormat::code`]. The codes are the classic `SERIAL_xyz` values, e.g.
/// `SERIAL_8N1 == 0x06`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameFormat {
    pub width: Width,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl FrameFormat {
    pub const SERIAL_5N1: FrameFormat = FrameFormat::new(Width::Five, Parity::None, StopBits::One);
    pub const SERIAL_6N1: FrameFormat = FrameFormat::new(Width::Six, Parity::None, StopBits::One);
    pub const SERIAL_7N1: FrameFormat = FrameFormat::new(Width::Seven, Parity::None, StopBits::One);
    pub const SERIAL_8N1: FrameFormat = FrameFormat::new(Width::Eight, Parity::None, StopBits::One);
    pub const SERIAL_5N2: FrameFormat = FrameFormat::new(Width::Five, Parity::None, StopBits::Two);
    pub const SERIAL_6N2: FrameFormat = FrameFormat::new(Width::Six, Parity::None, StopBits::Two);
    pub const SERIAL_7N2: FrameFormat = FrameFormat::new(Width::Seven, Parity::None, StopBits::Two);
    pub const SERIAL_8N2: FrameFormat = FrameFormat::new(Width::Eight, Parity::None, StopBits::Two);
    pub const SERIAL_5E1: FrameFormat = FrameFormat::new(Width::Five, Parity::Even, StopBits::One);
    pub const SERIAL_6E1: FrameFormat = FrameFormat::new(Width::Six, Parity::Even, StopBits::One);
    pub const SERIAL_7E1: FrameFormat = FrameFormat::new(Width::Seven, Parity::Even, StopBits::One);
    pub const SERIAL_8E1: FrameFormat = FrameFormat::new(Width::Eight, Parity::Even, StopBits::One);
    pub const SERIAL_5E2: FrameFormat = FrameFormat::new(Width::Five, Parity::Even, StopBits::Two);
    pub const SERIAL_6E2: FrameFormat = FrameFormat::new(Width::Six, Parity::Even, StopBits::Two);
    pub const SERIAL_7E2: FrameFormat = FrameFormat::new(Width::Seven, Parity::Even, StopBits::Two);
    pub const SERIAL_8E2: FrameFormat = FrameFormat::new(Width::Eight, Parity::Even, StopBits::Two);
    pub const SERIAL_5O1: FrameFormat = FrameFormat::new(Width::Five, Parity::Odd, StopBits::One);
    pub const SERIAL_6O1: FrameFormat = FrameFormat::new(Width::Six, Parity::Odd, StopBits::One);
    pub const SERIAL_7O1: FrameFormat = FrameFormat::new(Width::Seven, Parity::Odd, StopBits::One);
    pub const SERIAL_8O1: FrameFormat = FrameFormat::new(Width::Eight, Parity::Odd, StopBits::One);
    pub const SERIAL_5O2: FrameFormat = FrameFormat::new(Width::Five, Parity::Odd, StopBits::Two);
    pub const SERIAL_6O2: FrameFormat = FrameFormat::new(Width::Six, Parity::Odd, StopBits::Two);
    pub const SERIAL_7O2: FrameFormat = FrameFormat::new(Width::Seven, Parity::Odd, StopBits::Two);
    pub const SERIAL_8O2: FrameFormat = FrameFormat::new(Width::Eight, Parity::Odd, StopBits::Two);

    pub const fn new(width: Width, parity: Parity, stop_bits: StopBits) -> FrameFormat {
        FrameFormat {
            width,
            parity,
            stop_bits,
        }
    }

    /// The single-byte encoding of this format.
    ///
    /// Bits 5:4 hold the parity mode (0 none, 2 even, 3 odd), bit 3 is set
    /// for two stop bits and bits 2:1 hold the data width minus five.
    pub const fn code(&self) -> u8 {
        let parity = match self.parity {
            Parity::None => 0b00,
            Parity::Even => 0b10,
            Parity::Odd => 0b11,
        };
        let stop = match self.stop_bits {
            StopBits::One => 0,
            StopBits::Two => 1,
        };
        let width = self.width as u8 - 5;
        (parity << 4) | (stop << 3) | (width << 1)
    }

    /// Decode a single-byte frame format. Bits outside the fields described
    /// in [`FrameFormat::code`] must be clear.
    pub fn from_code(code: u8) -> Result<FrameFormat, ErrorCode> {
        if code & !0b0011_1110 != 0 {
            return Err(ErrorCode::INVAL);
        }
        let parity = match (code >> 4) & 0b11 {
            0b00 => Parity::None,
            0b10 => Parity::Even,
            0b11 => Parity::Odd,
            _ => return Err(ErrorCode::INVAL),
        };
        let stop_bits = if code & (1 << 3) != 0 {
            StopBits::Two
        } else {
            StopBits::One
        };
        let width = match (code >> 1) & 0b11 {
            0 => Width::Five,
            1 => Width::Six,
            2 => Width::Seven,
            _ => Width::Eight,
        };
        Ok(FrameFormat::new(width, parity, stop_bits))
    }
}

impl Default for FrameFormat {
    fn default() -> FrameFormat {
        FrameFormat::SERIAL_8N1
    }
}

/// Line configuration requested by a caller of [`Configure::configure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// Baud rate in bit/s.
    pub baud_rate: u32,
    pub format: FrameFormat,
}

impl Parameters {
    /// `baud_rate` with the default 8N1 frame format.
    pub const fn new(baud_rate: u32) -> Parameters {
        Parameters {
            baud_rate,
            format: FrameFormat::SERIAL_8N1,
        }
    }
}

pub trait Configure {
    /// (Re)configure the line and activate the port.
    ///
    /// Both buffers are emptied. Returns `Err(ErrorCode::INVAL)` or
    /// `Err(ErrorCode::SIZE)` if the baud rate cannot be produced from the
    /// peripheral clock; in that case nothing is changed.
    fn configure(&self, params: Parameters) -> Result<(), ErrorCode>;
}

/// The byte-stream contract offered to protocol layers.
pub trait ByteStream {
    /// Whether the port has been configured and not shut down since.
    fn is_active(&self) -> bool;

    /// Number of received bytes waiting to be read.
    fn available(&self) -> usize;

    /// The next received byte, without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Consume the next received byte. Returns `None` immediately when no
    /// byte is waiting.
    fn read(&self) -> Option<u8>;

    /// Queue `byte` for transmission and return the number of bytes accepted
    /// (0 if the port is not active, otherwise 1).
    ///
    /// Waits, without a timeout, while the transmit buffer is full.
    fn write(&self, byte: u8) -> usize;

    /// Wait until every queued byte has left the transmitter.
    fn flush(&self);

    /// Write each byte of `bytes` in turn. Returns the number accepted.
    fn write_bytes(&self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&byte| self.write(byte)).sum()
    }
}

/// Adapts a [`ByteStream`] to [`core::fmt::Write`].
pub struct StreamWriter<'a, S: ByteStream + ?Sized>(pub &'a S);

impl<S: ByteStream + ?Sized> fmt::Write for StreamWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.0.write_bytes(s.as_bytes()) == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameFormat, Parity, StopBits, Width};
    use crate::ErrorCode;

    #[test]
    fn codes_match_serial_constants() {
        let expected: [(FrameFormat, u8); 24] = [
            (FrameFormat::SERIAL_5N1, 0x00),
            (FrameFormat::SERIAL_6N1, 0x02),
            (FrameFormat::SERIAL_7N1, 0x04),
            (FrameFormat::SERIAL_8N1, 0x06),
            (FrameFormat::SERIAL_5N2, 0x08),
            (FrameFormat::SERIAL_6N2, 0x0A),
            (FrameFormat::SERIAL_7N2, 0x0C),
            (FrameFormat::SERIAL_8N2, 0x0E),
            (FrameFormat::SERIAL_5E1, 0x20),
            (FrameFormat::SERIAL_6E1, 0x22),
            (FrameFormat::SERIAL_7E1, 0x24),
            (FrameFormat::SERIAL_8E1, 0x26),
            (FrameFormat::SERIAL_5E2, 0x28),
            (FrameFormat::SERIAL_6E2, 0x2A),
            (FrameFormat::SERIAL_7E2, 0x2C),
            (FrameFormat::SERIAL_8E2, 0x2E),
            (FrameFormat::SERIAL_5O1, 0x30),
            (FrameFormat::SERIAL_6O1, 0x32),
            (FrameFormat::SERIAL_7O1, 0x34),
            (FrameFormat::SERIAL_8O1, 0x36),
            (FrameFormat::SERIAL_5O2, 0x38),
            (FrameFormat::SERIAL_6O2, 0x3A),
            (FrameFormat::SERIAL_7O2, 0x3C),
            (FrameFormat::SERIAL_8O2, 0x3E),
        ];

        for (format, code) in expected {
            assert_eq!(format.code(), code, "{:?}", format);
            assert_eq!(FrameFormat::from_code(code), Ok(format));
        }
    }

    #[test]
    fn default_is_8n1() {
        let format = FrameFormat::default();
        assert_eq!(format.width, Width::Eight);
        assert_eq!(format.parity, Parity::None);
        assert_eq!(format.stop_bits, StopBits::One);
    }

    #[test]
    fn rejects_unknown_codes() {
        // Reserved parity mode.
        assert_eq!(FrameFormat::from_code(0x16), Err(ErrorCode::INVAL));
        // Synchronous mode and clock polarity bits are not frame formats.
        assert_eq!(FrameFormat::from_code(0x46), Err(ErrorCode::INVAL));
        assert_eq!(FrameFormat::from_code(0x07), Err(ErrorCode::INVAL));
    }
}
