// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interrupt-driven, buffered USART driver.
//!
//! Each of the four USARTs gets a receive and a transmit ring buffer. The
//! receive complete interrupt moves incoming bytes into the RX buffer and the
//! data register empty interrupt feeds the TX buffer to the hardware, one
//! byte per interrupt. Foreground code only ever touches the buffers.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! use atmega2560::usart::USART0;
//! use kernel::hil::uart::ByteStream;
//!
//! USART0.begin(115200)?;
//! USART0.write_bytes(b"hello\r\n");
//! while let Some(byte) = USART0.read() {
//!     USART0.write(byte);
//! }
//! USART0.flush();
//! ```
//!
//! `write` blocks while the TX buffer is full. If it is called with
//! interrupts disabled, for example from another interrupt handler, it
//! feeds the hardware itself by polling the UDRE flag instead of waiting for
//! an interrupt that cannot be taken.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use avr::progmem::{Flash, ProgmemStr};
use avr::Avr;
use kernel::collections::ring_buffer::RingBuffer;
use kernel::config::CONFIG;
use kernel::hil::uart::{ByteStream, Configure, FrameFormat, Parameters, Parity, StopBits, Width};
use kernel::platform::chip::InterruptControl;
use kernel::utilities::program_space::write_program_str;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::baud::BaudSetting;
use crate::CPU_FREQUENCY_HZ;

/// Size of each of the RX and TX ring buffers of a port.
pub const SERIAL_BUFFER_SIZE: usize = 64;

register_structs! {
    pub UsartRegisters {
        /// Control and status register A
        (0x00 => ucsra: ReadWrite<u8, UCSRA::Register>),
        /// Control and status register B
        (0x01 => ucsrb: ReadWrite<u8, UCSRB::Register>),
        /// Control and status register C
        (0x02 => ucsrc: ReadWrite<u8, UCSRC::Register>),
        (0x03 => _reserved0),
        /// Baud rate register, low byte
        (0x04 => ubrrl: ReadWrite<u8>),
        /// Baud rate register, high nibble
        (0x05 => ubrrh: ReadWrite<u8>),
        /// Data register. Reads pop the receive FIFO, writes load the
        /// transmit buffer.
        (0x06 => udr: ReadWrite<u8>),
        (0x07 => @END),
    }
}

register_bitfields![u8,
    UCSRA [
        /// Receive complete
        RXC OFFSET(7) NUMBITS(1) [],
        /// Transmit complete, cleared by writing a one
        TXC OFFSET(6) NUMBITS(1) [],
        /// Data register empty
        UDRE OFFSET(5) NUMBITS(1) [],
        /// Frame error
        FE OFFSET(4) NUMBITS(1) [],
        /// Data overrun
        DOR OFFSET(3) NUMBITS(1) [],
        /// Parity error
        UPE OFFSET(2) NUMBITS(1) [],
        /// Double transmission speed
        U2X OFFSET(1) NUMBITS(1) [],
        /// Multi-processor communication mode
        MPCM OFFSET(0) NUMBITS(1) []
    ],
    UCSRB [
        /// RX complete interrupt enable
        RXCIE OFFSET(7) NUMBITS(1) [],
        /// TX complete interrupt enable
        TXCIE OFFSET(6) NUMBITS(1) [],
        /// Data register empty interrupt enable
        UDRIE OFFSET(5) NUMBITS(1) [],
        RXEN OFFSET(4) NUMBITS(1) [],
        TXEN OFFSET(3) NUMBITS(1) [],
        /// Character size, bit 2 (9-bit frames only)
        UCSZ2 OFFSET(2) NUMBITS(1) [],
        RXB8 OFFSET(1) NUMBITS(1) [],
        TXB8 OFFSET(0) NUMBITS(1) []
    ],
    UCSRC [
        UMSEL OFFSET(6) NUMBITS(2) [
            Asynchronous = 0,
            Synchronous = 1,
            MasterSpi = 3
        ],
        UPM OFFSET(4) NUMBITS(2) [
            Disabled = 0,
            Even = 2,
            Odd = 3
        ],
        USBS OFFSET(3) NUMBITS(1) [
            OneStopBit = 0,
            TwoStopBits = 1
        ],
        UCSZ OFFSET(1) NUMBITS(2) [
            FiveBits = 0,
            SixBits = 1,
            SevenBits = 2,
            EightBits = 3
        ],
        /// Clock polarity, synchronous mode only
        UCPOL OFFSET(0) NUMBITS(1) []
    ]
];

const USART0_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(0xC0 as *const UsartRegisters) };
const USART1_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(0xC8 as *const UsartRegisters) };
const USART2_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(0xD0 as *const UsartRegisters) };
const USART3_BASE: StaticRef<UsartRegisters> =
    unsafe { StaticRef::new(0x130 as *const UsartRegisters) };

pub static USART0: Usart<'static, Avr> = Usart::new(USART0_BASE, CPU_FREQUENCY_HZ, &Avr);
pub static USART1: Usart<'static, Avr> = Usart::new(USART1_BASE, CPU_FREQUENCY_HZ, &Avr);
pub static USART2: Usart<'static, Avr> = Usart::new(USART2_BASE, CPU_FREQUENCY_HZ, &Avr);
pub static USART3: Usart<'static, Avr> = Usart::new(USART3_BASE, CPU_FREQUENCY_HZ, &Avr);

/// All ports, indexed by USART number.
pub fn ports() -> [&'static Usart<'static, Avr>; 4] {
    [&USART0, &USART1, &USART2, &USART3]
}

/// Call `handler` with the index of every active port that has received
/// data waiting. Meant to be called from the firmware main loop.
pub fn serial_event_run<F>(handler: F)
where
    F: FnMut(usize, &Usart<'static, Avr>),
{
    dispatch_pending(&ports(), handler);
}

fn dispatch_pending<'a, I, F>(ports: &[&Usart<'a, I>], mut handler: F)
where
    I: InterruptControl,
    F: FnMut(usize, &Usart<'a, I>),
{
    for (index, &port) in ports.iter().enumerate() {
        if port.is_active() && port.available() > 0 {
            handler(index, port);
        }
    }
}

pub struct Usart<'a, I: InterruptControl> {
    registers: StaticRef<UsartRegisters>,
    clock_frequency: u32,
    interrupts: &'a I,
    rx_buffer: RingBuffer<SERIAL_BUFFER_SIZE>,
    tx_buffer: RingBuffer<SERIAL_BUFFER_SIZE>,
    /// Set by `begin`, cleared by `end`.
    active: AtomicBool,
    /// A byte has been handed to the transmitter since the last completed
    /// `flush`. Written by foreground code only.
    transmitting: AtomicBool,
    /// Bytes dropped by the receive handler because `rx_buffer` was full.
    /// Written by the receive handler only, except when cleared.
    rx_overruns: AtomicU8,
}

// Safety: the ring buffers are single-producer single-consumer, the flags
// are atomics and the registers are only reconfigured with interrupts
// masked through `I`, which serializes foreground code against the
// handlers on this single-core MCU.
unsafe impl<I: InterruptControl + Sync> Sync for Usart<'_, I> {}

impl<'a, I: InterruptControl> Usart<'a, I> {
    pub const fn new(
        base: StaticRef<UsartRegisters>,
        clock_frequency: u32,
        interrupts: &'a I,
    ) -> Usart<'a, I> {
        Usart {
            registers: base,
            clock_frequency,
            interrupts,
            rx_buffer: RingBuffer::new(),
            tx_buffer: RingBuffer::new(),
            active: AtomicBool::new(false),
            transmitting: AtomicBool::new(false),
            rx_overruns: AtomicU8::new(0),
        }
    }

    /// Configure the port for `baud` with 8N1 frames and enable it.
    pub fn begin(&self, baud: u32) -> Result<(), ErrorCode> {
        self.begin_with_format(baud, FrameFormat::SERIAL_8N1)
    }

    /// Configure the port and enable the receiver, the transmitter and the
    /// receive interrupt.
    ///
    /// Pending bytes in both buffers are discarded, also when the port was
    /// already running. On error the port is left as it was.
    pub fn begin_with_format(&self, baud: u32, format: FrameFormat) -> Result<(), ErrorCode> {
        let setting = BaudSetting::compute(self.clock_frequency, baud).map_err(|err| {
            log::warn!("cannot generate {} baud: {:?}", baud, err);
            err
        })?;

        let regs = self.registers;
        self.interrupts.atomic(|| {
            // UBRRH must be written before UBRRL; the low byte write
            // updates the prescaler.
            regs.ubrrh.set(setting.high());
            regs.ubrrl.set(setting.low());
            regs.ucsra
                .write(UCSRA::U2X.val(u8::from(setting.double_speed)));
            regs.ucsrc.write(
                UCSRC::UMSEL::Asynchronous
                    + match format.parity {
                        Parity::None => UCSRC::UPM::Disabled,
                        Parity::Even => UCSRC::UPM::Even,
                        Parity::Odd => UCSRC::UPM::Odd,
                    }
                    + match format.stop_bits {
                        StopBits::One => UCSRC::USBS::OneStopBit,
                        StopBits::Two => UCSRC::USBS::TwoStopBits,
                    }
                    + match format.width {
                        Width::Five => UCSRC::UCSZ::FiveBits,
                        Width::Six => UCSRC::UCSZ::SixBits,
                        Width::Seven => UCSRC::UCSZ::SevenBits,
                        Width::Eight => UCSRC::UCSZ::EightBits,
                    },
            );
            regs.ucsrb
                .write(UCSRB::RXEN::SET + UCSRB::TXEN::SET + UCSRB::RXCIE::SET);

            self.rx_buffer.empty();
            self.tx_buffer.empty();
            self.transmitting.store(false, Ordering::Relaxed);
            self.rx_overruns.store(0, Ordering::Relaxed);
            self.active.store(true, Ordering::Release);
        });

        if CONFIG.trace_line_config {
            log::debug!(
                "{} baud: ubrr {}, u2x {}, actual {} baud, frame 0x{:02x}",
                baud,
                setting.ubrr,
                setting.double_speed,
                setting.actual_rate(self.clock_frequency),
                format.code()
            );
        }
        Ok(())
    }

    /// Wait for pending output, then disable the port.
    ///
    /// Unread input is discarded. The port can be enabled again with
    /// `begin`.
    pub fn end(&self) {
        self.flush();

        let regs = self.registers;
        self.interrupts.atomic(|| {
            regs.ucsrb.modify(
                UCSRB::RXEN::CLEAR + UCSRB::TXEN::CLEAR + UCSRB::RXCIE::CLEAR + UCSRB::UDRIE::CLEAR,
            );
            self.rx_buffer.empty();
            self.active.store(false, Ordering::Release);
        });
        log::debug!("port disabled");
    }

    /// Number of bytes that can be written without blocking.
    pub fn available_for_write(&self) -> usize {
        self.interrupts.atomic(|| self.tx_buffer.available_len())
    }

    /// Write a string stored in flash with [`avr::progmem_str!`]. Returns
    /// the number of bytes written.
    pub fn print_program_string(&self, s: ProgmemStr) -> usize {
        // Safety: a `ProgmemStr` always points to a NUL-terminated string in
        // program memory.
        unsafe { write_program_str(self, &Flash, s.as_ptr()) }
    }

    /// Bytes lost because the receive buffer was full, saturating at 255.
    pub fn rx_overruns(&self) -> u8 {
        self.rx_overruns.load(Ordering::Relaxed)
    }

    pub fn clear_rx_overruns(&self) {
        self.rx_overruns.store(0, Ordering::Relaxed);
    }

    /// USARTn RX interrupt handler.
    pub fn handle_receive_interrupt(&self) {
        // Reading UDR clears RXC.
        let byte = self.registers.udr.get();
        if !self.rx_buffer.push(byte) && CONFIG.count_rx_overruns {
            let overruns = self.rx_overruns.load(Ordering::Relaxed);
            self.rx_overruns
                .store(overruns.saturating_add(1), Ordering::Relaxed);
        }
    }

    /// USARTn UDRE interrupt handler.
    pub fn handle_data_register_empty_interrupt(&self) {
        let regs = self.registers;
        match self.tx_buffer.pop() {
            Some(byte) => {
                regs.udr.set(byte);
                self.clear_transmit_complete();
                if self.tx_buffer.is_empty() {
                    regs.ucsrb.modify(UCSRB::UDRIE::CLEAR);
                }
            }
            None => regs.ucsrb.modify(UCSRB::UDRIE::CLEAR),
        }
    }

    /// TXC is cleared by writing a one to it. U2X is the only other bit of
    /// UCSRA that must keep its value.
    fn clear_transmit_complete(&self) {
        let regs = self.registers;
        let u2x = regs.ucsra.read(UCSRA::U2X);
        regs.ucsra.write(UCSRA::TXC::SET + UCSRA::U2X.val(u2x));
    }

    fn transmitter_idle(&self) -> bool {
        !self.transmitting.load(Ordering::Relaxed) || self.registers.ucsra.is_set(UCSRA::TXC)
    }

    /// With interrupts disabled the UDRE handler cannot run, so feed the
    /// transmitter from here whenever it has room.
    fn drain_if_interrupts_masked(&self) {
        if !self.interrupts.interrupts_enabled() && self.registers.ucsra.is_set(UCSRA::UDRE) {
            self.handle_data_register_empty_interrupt();
        }
    }
}

impl<I: InterruptControl> Configure for Usart<'_, I> {
    fn configure(&self, params: Parameters) -> Result<(), ErrorCode> {
        self.begin_with_format(params.baud_rate, params.format)
    }
}

impl<I: InterruptControl> ByteStream for Usart<'_, I> {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn available(&self) -> usize {
        self.interrupts.atomic(|| self.rx_buffer.len())
    }

    fn peek(&self) -> Option<u8> {
        self.rx_buffer.peek()
    }

    fn read(&self) -> Option<u8> {
        self.rx_buffer.pop()
    }

    fn write(&self, byte: u8) -> usize {
        if !self.is_active() {
            return 0;
        }
        let regs = self.registers;

        // Idle line: skip the buffer and the interrupt round trip.
        let sent = self.interrupts.atomic(|| {
            if self.tx_buffer.is_empty()
                && regs.ucsra.is_set(UCSRA::UDRE)
                && self.transmitter_idle()
            {
                regs.udr.set(byte);
                self.clear_transmit_complete();
                regs.ucsrb.modify(UCSRB::UDRIE::SET);
                self.transmitting.store(true, Ordering::Relaxed);
                true
            } else {
                false
            }
        });
        if sent {
            return 1;
        }

        // The space check and the push share one critical section: a writer
        // in an interrupt handler may take a slot freed in between.
        loop {
            let queued = self.interrupts.atomic(|| {
                if !self.tx_buffer.push(byte) {
                    return false;
                }
                self.transmitting.store(true, Ordering::Relaxed);
                self.clear_transmit_complete();
                regs.ucsrb.modify(UCSRB::UDRIE::SET);
                true
            });
            if queued {
                return 1;
            }
            self.drain_if_interrupts_masked();
        }
    }

    fn flush(&self) {
        if !self.transmitting.load(Ordering::Relaxed) {
            return;
        }
        loop {
            self.drain_if_interrupts_masked();
            if self.tx_buffer.is_empty() && self.registers.ucsra.is_set(UCSRA::TXC) {
                break;
            }
        }
        self.transmitting.store(false, Ordering::Relaxed);
    }
}
