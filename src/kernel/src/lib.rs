//! KaikuOS Kernel
//!
//! A small x86_64 kernel built around one subsystem: a unified character
//! console that multiplexes the serial line, the parallel port and the
//! text-mode display behind a single get/put character interface, with a
//! PS/2 keyboard and the serial line feeding the input side.
//!
//! # Architecture
//!
//! The kernel is structured into the following modules:
//! - `console`: the device drivers, scancode decoder, input ring and facade
//! - `arch`: platform-specific code (port I/O, video memory, PIC, IDT)
//! - `boot`, `logger`, `testutil`: boot output, `log` routing, QEMU tests
//!
//! # Safety
//!
//! This is a `#![no_std]` kernel. All unsafe code is documented with safety
//! invariants explaining why the usage is correct.

#![no_std]
#![cfg_attr(target_arch = "x86_64", feature(abi_x86_interrupt))]
#![warn(missing_docs)]

pub mod arch;
pub mod boot;
pub mod console;
pub mod logger;
pub mod testutil;

/// Initializes core kernel subsystems.
///
/// Called early in the boot process to set up essential services: the
/// console (display, keyboard, serial — in that order), the log router,
/// and finally interrupt delivery.
pub fn init() {
    #[cfg(target_arch = "x86_64")]
    {
        console::init();
        logger::init();
        arch::x86_64::interrupts::init_idt();
    }
}
