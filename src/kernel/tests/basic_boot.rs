#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(kaiku_kernel::testutil::test_runner)]
#![reexport_test_harness_main = "test_main"]

use core::panic::PanicInfo;
use kaiku_kernel::console::ring::InputRing;
use kaiku_kernel::testutil::{exit_qemu, QemuExitCode};
use kaiku_kernel::{console, println};

#[no_mangle]
pub extern "C" fn _start() -> ! {
    kaiku_kernel::init();
    test_main();
    exit_qemu(QemuExitCode::Success);
    loop {}
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    kaiku_kernel::testutil::test_panic_handler(info)
}

#[test_case]
fn println_reaches_the_console() {
    println!("basic boot output");
}

#[test_case]
fn poll_char_is_empty_without_input() {
    assert_eq!(console::poll_char(), None);
}

#[test_case]
fn ring_keeps_fifo_order() {
    let mut ring = InputRing::new();
    for byte in 10..20u8 {
        ring.push(byte);
    }
    for byte in 10..20u8 {
        assert_eq!(ring.pop(), Some(byte));
    }
}
