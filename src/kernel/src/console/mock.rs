//! Scripted hardware doubles for console unit tests.
//!
//! `FakeBus` answers port reads from a script and records every write;
//! `FakeVideo` is an in-memory text region whose color window can be made
//! unwritable to exercise the display probe's monochrome fallback.

use kaiku_hal::{PortBus, VideoMem};

use super::display::COLOR_BASE_CELL;

const MAX_SCRIPTED: usize = 32;
const MAX_WRITES: usize = 256;
const MAX_READS: usize = 64;
const REGION_CELLS: usize = 0x8000;

/// A port bus that replays scripted reads and records writes.
///
/// Each scripted entry is consumed by the first read of its port, in
/// script order; reads with no script left return 0. Reads are counted per
/// port so tests can assert on flush sequences without scripting them.
pub struct FakeBus {
    scripted: [(u16, u8); MAX_SCRIPTED],
    consumed: [bool; MAX_SCRIPTED],
    scripted_len: usize,
    writes: [(u16, u8); MAX_WRITES],
    write_len: usize,
    read_log: [(u16, u32); MAX_READS],
    read_ports: usize,
}

impl FakeBus {
    /// An empty bus: all reads return 0.
    pub fn new() -> Self {
        FakeBus {
            scripted: [(0, 0); MAX_SCRIPTED],
            consumed: [false; MAX_SCRIPTED],
            scripted_len: 0,
            writes: [(0, 0); MAX_WRITES],
            write_len: 0,
            read_log: [(0, 0); MAX_READS],
            read_ports: 0,
        }
    }

    /// Queues one read result for the given port.
    pub fn script_read(&mut self, port: u16, value: u8) {
        assert!(self.scripted_len < MAX_SCRIPTED, "read script full");
        self.scripted[self.scripted_len] = (port, value);
        self.scripted_len += 1;
    }

    /// Every write recorded so far, in order.
    pub fn writes(&self) -> &[(u16, u8)] {
        &self.writes[..self.write_len]
    }

    /// All values written to one port, in order.
    pub fn writes_to(&self, port: u16) -> impl Iterator<Item = u8> + '_ {
        self.writes()
            .iter()
            .filter(move |&&(p, _)| p == port)
            .map(|&(_, value)| value)
    }

    /// Number of reads issued against one port.
    pub fn reads_from(&self, port: u16) -> u32 {
        self.read_log[..self.read_ports]
            .iter()
            .find(|&&(p, _)| p == port)
            .map(|&(_, count)| count)
            .unwrap_or(0)
    }

    fn log_read(&mut self, port: u16) {
        for entry in self.read_log[..self.read_ports].iter_mut() {
            if entry.0 == port {
                entry.1 += 1;
                return;
            }
        }
        if self.read_ports < MAX_READS {
            self.read_log[self.read_ports] = (port, 1);
            self.read_ports += 1;
        }
    }
}

impl Default for FakeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PortBus for FakeBus {
    fn read(&mut self, port: u16) -> u8 {
        self.log_read(port);
        for i in 0..self.scripted_len {
            if !self.consumed[i] && self.scripted[i].0 == port {
                self.consumed[i] = true;
                return self.scripted[i].1;
            }
        }
        0
    }

    fn write(&mut self, port: u16, value: u8) {
        assert!(self.write_len < MAX_WRITES, "write log full");
        self.writes[self.write_len] = (port, value);
        self.write_len += 1;
    }
}

/// An in-memory text region.
pub struct FakeVideo {
    cells: [u16; REGION_CELLS],
    color_backed: bool,
}

impl FakeVideo {
    /// A region with both windows writable (a color adapter).
    pub fn new() -> Self {
        FakeVideo {
            cells: [0; REGION_CELLS],
            color_backed: true,
        }
    }

    /// A region whose color window drops stores (a monochrome adapter).
    pub fn unbacked_color() -> Self {
        FakeVideo {
            color_backed: false,
            ..Self::new()
        }
    }

    /// Direct cell read, bypassing the `VideoMem` bookkeeping.
    pub fn load_raw(&self, cell: usize) -> u16 {
        self.cells[cell]
    }

    /// Direct cell write, bypassing the unbacked-window emulation.
    pub fn store_raw(&mut self, cell: usize, value: u16) {
        self.cells[cell] = value;
    }
}

impl Default for FakeVideo {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMem for FakeVideo {
    fn load(&mut self, cell: usize) -> u16 {
        self.cells[cell]
    }

    fn store(&mut self, cell: usize, value: u16) {
        if !self.color_backed && cell >= COLOR_BASE_CELL {
            return;
        }
        self.cells[cell] = value;
    }
}
