//! Real port-I/O and video-memory access for x86_64.

use kaiku_hal::{PortBus, VideoMem};
use x86_64::instructions::port::Port;

/// I/O-port access through `in`/`out` instructions.
pub struct PortIo;

impl PortBus for PortIo {
    fn read(&mut self, port: u16) -> u8 {
        // SAFETY: reading a legacy ISA device register. We run in ring 0
        // with full I/O privilege, and the console drivers only name ports
        // of the devices they own.
        unsafe { Port::new(port).read() }
    }

    fn write(&mut self, port: u16, value: u8) {
        // SAFETY: as for `read`; writes target device registers whose
        // side effects the calling driver expects.
        unsafe { Port::new(port).write(value) }
    }
}

/// Base of the legacy text-mode region: the monochrome window, with the
/// color window 0x8000 bytes above it.
const TEXT_REGION_BASE: usize = 0xB0000;

/// 16-bit cells in the region (0xB0000..0xC0000).
const TEXT_REGION_CELLS: usize = 0x8000;

/// The memory-mapped text region.
///
/// The bootloader identity-maps low memory, so the window addresses are
/// usable directly.
pub struct VgaMemory;

impl VgaMemory {
    fn cell_ptr(cell: usize) -> *mut u16 {
        debug_assert!(cell < TEXT_REGION_CELLS, "cell outside the text region");
        (TEXT_REGION_BASE as *mut u16).wrapping_add(cell)
    }
}

impl VideoMem for VgaMemory {
    fn load(&mut self, cell: usize) -> u16 {
        // SAFETY: the text region exists for the kernel's lifetime and the
        // pointer stays inside it. Volatile because the display hardware
        // reads and refreshes these cells at any time.
        unsafe { core::ptr::read_volatile(Self::cell_ptr(cell)) }
    }

    fn store(&mut self, cell: usize, value: u16) {
        // SAFETY: as for `load`.
        unsafe { core::ptr::write_volatile(Self::cell_ptr(cell), value) }
    }
}
