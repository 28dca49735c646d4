//! Register-level 16550 serial line driver.
//!
//! The line discipline is fixed at 9600 baud, 8 data bits, 1 stop bit, no
//! parity, FIFO off. Presence is detected once at init: a line-status
//! register that reads back all ones means no hardware is behind the port,
//! and every later operation on the device degrades to a no-op.

use kaiku_hal::PortBus;

use super::{io_delay, TRANSMIT_SPIN_BUDGET};

/// COM1 base port.
pub const COM1_BASE: u16 = 0x3F8;

/// In: receive buffer (DLAB=0).
const RX: u16 = 0;
/// Out: transmit buffer (DLAB=0).
const TX: u16 = 0;
/// Out: divisor latch low byte (DLAB=1).
const DIVISOR_LOW: u16 = 0;
/// Out: divisor latch high byte (DLAB=1).
const DIVISOR_HIGH: u16 = 1;
/// Out: interrupt enable register.
const INT_ENABLE: u16 = 1;
/// In: interrupt identification register.
const INT_ID: u16 = 2;
/// Out: FIFO control register.
const FIFO_CTRL: u16 = 2;
/// Out: line control register.
const LINE_CTRL: u16 = 3;
/// Out: modem control register.
const MODEM_CTRL: u16 = 4;
/// In: line status register.
const LINE_STATUS: u16 = 5;

/// Line control: divisor latch access bit.
const LCR_DLAB: u8 = 0x80;
/// Line control: 8-bit word length.
const LCR_WORD_LEN_8: u8 = 0x03;
/// Interrupt enable: receive-data interrupt.
const IER_RECV_DATA: u8 = 0x01;
/// Line status: received data available.
const LSR_DATA_READY: u8 = 0x01;
/// Line status: transmit buffer empty.
const LSR_TX_READY: u8 = 0x20;
/// Line status value of a port with no hardware behind it.
const LSR_MISSING: u8 = 0xFF;

/// UART reference clock in Hz.
const BASE_CLOCK: u32 = 115_200;
/// Configured line speed.
const TARGET_BAUD: u32 = 9_600;

/// A 16550-compatible serial line.
pub struct SerialDevice {
    base: u16,
    spin_budget: usize,
    exists: bool,
}

impl SerialDevice {
    /// Creates an uninitialized device on the given base port.
    ///
    /// `spin_budget` bounds the transmit-ready busy-wait; tests pass 0 to
    /// exercise the give-up path deterministically.
    pub const fn new(base: u16, spin_budget: usize) -> Self {
        SerialDevice {
            base,
            spin_budget,
            exists: false,
        }
    }

    /// The COM1 device with the default spin budget.
    pub const fn com1() -> Self {
        Self::new(COM1_BASE, TRANSMIT_SPIN_BUDGET)
    }

    /// Whether hardware was found behind the port at init.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Programs the line discipline and latches hardware presence.
    pub fn init(&mut self, bus: &mut impl PortBus) {
        // turn off the FIFO
        bus.write(self.base + FIFO_CTRL, 0);

        // set speed; requires the DLAB latch
        bus.write(self.base + LINE_CTRL, LCR_DLAB);
        bus.write(self.base + DIVISOR_LOW, (BASE_CLOCK / TARGET_BAUD) as u8);
        bus.write(self.base + DIVISOR_HIGH, 0);

        // 8 data bits, 1 stop bit, parity off; drops the DLAB latch
        bus.write(self.base + LINE_CTRL, LCR_WORD_LEN_8 & !LCR_DLAB);

        // no modem controls
        bus.write(self.base + MODEM_CTRL, 0);
        // receive interrupts only
        bus.write(self.base + INT_ENABLE, IER_RECV_DATA);

        // a line status of all ones means there is no device on the port
        self.exists = bus.read(self.base + LINE_STATUS) != LSR_MISSING;
        if self.exists {
            // clear any pre-existing overrun indications and interrupts
            bus.read(self.base + INT_ID);
            bus.read(self.base + RX);
        }
    }

    /// Sends one byte, best effort.
    ///
    /// Waits for the transmitter for at most the spin budget, then writes
    /// the byte regardless. This is polling with a hard iteration cap, not
    /// a blocking wait.
    pub fn transmit(&mut self, bus: &mut impl PortBus, byte: u8) {
        if !self.exists {
            return;
        }
        let mut spins = 0;
        while bus.read(self.base + LINE_STATUS) & LSR_TX_READY == 0 && spins < self.spin_budget {
            io_delay(bus);
            spins += 1;
        }
        bus.write(self.base + TX, byte);
    }

    /// Returns one received byte, if the line has data waiting.
    pub fn poll_receive(&mut self, bus: &mut impl PortBus) -> Option<u8> {
        if !self.exists {
            return None;
        }
        if bus.read(self.base + LINE_STATUS) & LSR_DATA_READY == 0 {
            return None;
        }
        Some(bus.read(self.base + RX))
    }
}
