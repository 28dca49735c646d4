//! KaikuOS Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines traits that abstract away platform-specific hardware
//! details, so device logic can be exercised against scripted fakes in tests.

#![no_std]

/// Trait for byte-granular access to hardware I/O ports.
///
/// This is the leaf dependency of every port-programmed device driver.
/// Implementations are free to script reads and record writes; the real
/// x86_64 implementation issues `in`/`out` instructions.
pub trait PortBus {
    /// Reads one byte from the given I/O port.
    fn read(&mut self, port: u16) -> u8;
    /// Writes one byte to the given I/O port.
    fn write(&mut self, port: u16, value: u8);
}

/// Trait for 16-bit cell access into a memory-mapped text region.
///
/// `cell` indexes glyph/attribute pairs from the start of the region
/// (monochrome window first, color window above it). A cell that is not
/// backed by writable memory may drop stores; the display probe relies on
/// reading such a store back.
pub trait VideoMem {
    /// Loads the cell at the given index.
    fn load(&mut self, cell: usize) -> u16;
    /// Stores a glyph/attribute pair at the given index.
    fn store(&mut self, cell: usize, value: u16);
}

/// Trait for a unified character console.
///
/// This is the seam the rest of the kernel consumes: one byte in, one byte
/// out, with the multiplexing of the underlying devices hidden behind it.
pub trait CharConsole {
    /// Writes one byte to every output device.
    fn put_char(&mut self, byte: u8);
    /// Returns the next buffered input byte, if any, after draining all
    /// input sources.
    fn poll_char(&mut self) -> Option<u8>;
    /// Busy-waits until an input byte is available.
    fn get_char(&mut self) -> u8;
}
