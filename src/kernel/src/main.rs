//! KaikuOS Kernel Entry Point
//!
//! Brings the console up, reports the boot status, then echoes console
//! input back through every output device.

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(kaiku_kernel::testutil::test_runner)]
#![reexport_test_harness_main = "test_main"]

use bootloader::{entry_point, BootInfo};
use core::panic::PanicInfo;
use kaiku_kernel::arch::x86_64;
use kaiku_kernel::boot::{self, Status};
use kaiku_kernel::console::{self, display::Color};
use kaiku_kernel::{println, serial_println};

entry_point!(kernel_main);

/// Kernel entry point.
///
/// Called by the bootloader after setting up the initial environment.
fn kernel_main(_boot_info: &'static BootInfo) -> ! {
    kaiku_kernel::init();

    console::clear_screen();
    boot::banner::print_banner();

    boot::log(Status::Ok, "Console initialized");
    boot::log(Status::Ok, "IDT configured");
    if console::serial_present() {
        boot::log(Status::Ok, "Serial line ready");
        boot::log_detail("9600 baud, 8N1, COM1");
    } else {
        boot::log(Status::Warn, "Serial port not present");
    }

    kaiku_kernel::tests::run_all();
    boot::log(Status::Ok, "Self checks passed");

    // Test exception handling
    ::x86_64::instructions::interrupts::int3();
    boot::log(Status::Ok, "Exception handling verified");

    #[cfg(test)]
    test_main();

    log::info!("console ready, entering echo loop");
    println!();
    console::set_color(Color::Cyan, Color::Black);
    println!(" Keys echo to the display, serial and parallel lines.");
    console::set_color(Color::White, Color::Black);
    println!();

    loop {
        match console::poll_char() {
            Some(b'\r') => println!(),
            Some(byte) if byte < 0x80 => console::put_char(byte),
            Some(code) => log::info!("non-ascii key code {:#04x}", code),
            None => x86_64::hlt(),
        }
    }
}

/// Panic handler.
///
/// Called when the kernel encounters an unrecoverable error.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // The serial line first: it keeps working when the display does not.
    serial_println!("KERNEL PANIC: {}", info);

    console::set_color(Color::LightRed, Color::Black);
    println!("\n\n!!! KERNEL PANIC !!!");
    console::set_color(Color::White, Color::Black);
    println!("{}", info);

    x86_64::halt_loop()
}
