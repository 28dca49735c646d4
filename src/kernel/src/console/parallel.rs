//! Parallel printer port output.
//!
//! Write-only: a byte is placed on the data lines and latched into the
//! printer by pulsing the strobe line high and back low. There is no
//! receive contract and no presence detection; a missing printer simply
//! never reports ready and the bounded spin gives up.

use kaiku_hal::PortBus;

use super::{io_delay, TRANSMIT_SPIN_BUDGET};

/// LPT1 base port.
pub const LPT1_BASE: u16 = 0x378;

/// Out: data lines.
const DATA: u16 = 0;
/// In: printer status.
const STATUS: u16 = 1;
/// Out: control lines.
const CONTROL: u16 = 2;

/// Status bit: printer is not busy.
const STATUS_NOT_BUSY: u8 = 0x80;
/// Control bit: strobe line.
const CONTROL_STROBE: u8 = 0x01;
/// Control bit: initialize printer.
const CONTROL_INIT: u8 = 0x04;
/// Control bit: select printer.
const CONTROL_SELECT: u8 = 0x08;

/// A parallel printer line.
pub struct ParallelDevice {
    base: u16,
    spin_budget: usize,
}

impl ParallelDevice {
    /// Creates a device on the given base port with a bounded spin budget.
    pub const fn new(base: u16, spin_budget: usize) -> Self {
        ParallelDevice { base, spin_budget }
    }

    /// The LPT1 device with the default spin budget.
    pub const fn lpt1() -> Self {
        Self::new(LPT1_BASE, TRANSMIT_SPIN_BUDGET)
    }

    /// Sends one byte, best effort, latching it with a strobe pulse.
    pub fn transmit(&mut self, bus: &mut impl PortBus, byte: u8) {
        let mut spins = 0;
        while bus.read(self.base + STATUS) & STATUS_NOT_BUSY == 0 && spins < self.spin_budget {
            io_delay(bus);
            spins += 1;
        }
        bus.write(self.base + DATA, byte);
        bus.write(
            self.base + CONTROL,
            CONTROL_SELECT | CONTROL_INIT | CONTROL_STROBE,
        );
        bus.write(self.base + CONTROL, CONTROL_SELECT);
    }
}
