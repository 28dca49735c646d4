//! The unified character console.
//!
//! One facade multiplexes three output devices (serial, parallel, text
//! display) and two input sources (PS/2 keyboard, serial) behind a single
//! get/put character interface:
//!
//! - `put_char` fans a byte out to every output device unconditionally.
//! - `poll_char` drains both input sources into the ring buffer and pops
//!   one byte; `get_char` busy-waits on it.
//! - `keyboard_interrupt`/`serial_interrupt` are the entry points external
//!   interrupt dispatch invokes; they run the same drain as the polling
//!   path, so input flows identically with or without working interrupts.
//!
//! # Concurrency
//!
//! The ring buffer's write cursor is touched from interrupt handlers and
//! from the synchronous polling path. Every global entry point below
//! therefore executes inside one critical section: interrupts disabled for
//! the duration of the call, with the singleton behind a spinlock. A drain
//! can never preempt another drain, which is the single-writer invariant
//! the ring relies on.

pub mod display;
pub mod keyboard;
pub mod parallel;
pub mod ring;
pub mod serial;

#[cfg(test)]
pub(crate) mod mock;

use core::fmt;

use kaiku_hal::{CharConsole, PortBus, VideoMem};

use self::display::{Color, Display};
use self::keyboard::{Decoded, KeyDecoder};
use self::parallel::ParallelDevice;
use self::ring::InputRing;
use self::serial::SerialDevice;

/// Iteration cap for the transmit-ready busy-waits of the output devices.
pub(crate) const TRANSMIT_SPIN_BUDGET: usize = 12800;

/// Port whose reads pace out accesses to slow ISA devices.
const DELAY_PORT: u16 = 0x84;

/// I/O delay: four reads of port 0x84, roughly 5us on historical PCs.
pub(crate) fn io_delay(bus: &mut impl PortBus) {
    for _ in 0..4 {
        bus.read(DELAY_PORT);
    }
}

/// The console state: every device plus the input pipeline, owned in one
/// place and threaded through every operation.
pub struct Console<B: PortBus, V: VideoMem> {
    bus: B,
    video: V,
    serial: SerialDevice,
    parallel: ParallelDevice,
    display: Display,
    decoder: KeyDecoder,
    ring: InputRing,
}

impl<B: PortBus, V: VideoMem> Console<B, V> {
    /// Creates a console over the given bus and video memory.
    pub fn new(bus: B, video: V) -> Self {
        Console {
            bus,
            video,
            serial: SerialDevice::com1(),
            parallel: ParallelDevice::lpt1(),
            display: Display::new(),
            decoder: KeyDecoder::new(),
            ring: InputRing::new(),
        }
    }

    /// Brings the devices up: display first so diagnostics are visible as
    /// early as possible, then the keyboard path, then serial. A missing
    /// serial port is reported once and is not fatal.
    pub fn init(&mut self) {
        self.display.init(&mut self.video, &mut self.bus);
        self.drain_keyboard();
        self.serial.init(&mut self.bus);
        if !self.serial.exists() {
            let _ = fmt::Write::write_str(self, "serial port does not exist\n");
        }
    }

    /// Writes one byte to serial, parallel and display, unconditionally.
    pub fn put_char(&mut self, byte: u8) {
        self.serial.transmit(&mut self.bus, byte);
        self.parallel.transmit(&mut self.bus, byte);
        self.display.put_char(&mut self.video, &mut self.bus, byte);
    }

    /// Drains both input sources, then returns the next buffered byte.
    ///
    /// Polling here is what keeps the console usable when interrupts are
    /// disabled or broken: the read path pulls input itself.
    pub fn poll_char(&mut self) -> Option<u8> {
        self.drain_serial();
        self.drain_keyboard();
        self.ring.pop()
    }

    /// Busy-waits until an input byte arrives, skipping zero bytes.
    pub fn get_char(&mut self) -> u8 {
        loop {
            match self.poll_char() {
                Some(0) | None => core::hint::spin_loop(),
                Some(byte) => return byte,
            }
        }
    }

    /// Keyboard interrupt entry point.
    pub fn keyboard_interrupt(&mut self) {
        self.drain_keyboard();
    }

    /// Serial interrupt entry point.
    pub fn serial_interrupt(&mut self) {
        if self.serial.exists() {
            self.drain_serial();
        }
    }

    /// Whether serial hardware was found at init.
    pub fn serial_present(&self) -> bool {
        self.serial.exists()
    }

    /// Sets the display attribute for subsequent output.
    pub fn set_color(&mut self, foreground: Color, background: Color) {
        self.display.set_color(foreground, background);
    }

    /// Blanks the display and homes its cursor.
    pub fn clear_screen(&mut self) {
        self.display.clear_screen(&mut self.video, &mut self.bus);
    }

    fn drain_keyboard(&mut self) {
        let Console {
            bus, decoder, ring, ..
        } = self;
        ring.drain(|| {
            let scancode = keyboard::poll_scancode(bus)?;
            Some(match decoder.decode(bus, scancode) {
                Decoded::Char(byte) => byte,
                Decoded::Ignored | Decoded::Reset => 0,
            })
        });
    }

    fn drain_serial(&mut self) {
        let Console {
            bus, serial, ring, ..
        } = self;
        ring.drain(|| serial.poll_receive(bus));
    }
}

impl<B: PortBus, V: VideoMem> fmt::Write for Console<B, V> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            match byte {
                // Printable ASCII and the control characters put_char knows.
                0x20..=0x7E | b'\n' | b'\r' | b'\t' | 0x08 => self.put_char(byte),
                _ => self.put_char(0xFE),
            }
        }
        Ok(())
    }
}

impl<B: PortBus, V: VideoMem> CharConsole for Console<B, V> {
    fn put_char(&mut self, byte: u8) {
        Console::put_char(self, byte);
    }

    fn poll_char(&mut self) -> Option<u8> {
        Console::poll_char(self)
    }

    fn get_char(&mut self) -> u8 {
        Console::get_char(self)
    }
}

/// Serial-only sink for panic and test output, so a wedged display or
/// printer cannot swallow it.
struct SerialSink<'a, B: PortBus, V: VideoMem>(&'a mut Console<B, V>);

impl<B: PortBus, V: VideoMem> fmt::Write for SerialSink<'_, B, V> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.0.serial.transmit(&mut self.0.bus, byte);
        }
        Ok(())
    }
}

#[cfg(target_arch = "x86_64")]
pub use system::{
    clear_screen, get_char, init, is_console, keyboard_interrupt, poll_char, put_char,
    serial_interrupt, serial_present, set_color, _print, _serial_print,
};

#[cfg(target_arch = "x86_64")]
mod system {
    use spin::{Mutex, Once};
    use x86_64::instructions::interrupts;

    use super::*;
    use crate::arch::x86_64::io::{PortIo, VgaMemory};

    type SystemConsole = Console<PortIo, VgaMemory>;

    /// The console singleton, created on first use.
    static CONSOLE: Once<Mutex<SystemConsole>> = Once::new();

    fn console() -> &'static Mutex<SystemConsole> {
        CONSOLE.call_once(|| Mutex::new(Console::new(PortIo, VgaMemory)))
    }

    /// Runs `f` on the console inside the critical section: interrupts off,
    /// singleton locked. All public entry points funnel through here.
    fn with_console<R>(f: impl FnOnce(&mut SystemConsole) -> R) -> R {
        interrupts::without_interrupts(|| f(&mut console().lock()))
    }

    /// Initializes the console devices.
    pub fn init() {
        with_console(|console| console.init());
    }

    /// Writes one byte to every output device.
    pub fn put_char(byte: u8) {
        with_console(|console| console.put_char(byte));
    }

    /// Drains both input sources and returns the next buffered byte.
    pub fn poll_char() -> Option<u8> {
        with_console(|console| console.poll_char())
    }

    /// Busy-waits for an input byte, skipping zero bytes.
    ///
    /// The wait spins outside the critical section so interrupts keep
    /// arriving between polls.
    pub fn get_char() -> u8 {
        loop {
            match poll_char() {
                Some(0) | None => core::hint::spin_loop(),
                Some(byte) => return byte,
            }
        }
    }

    /// Whether the given file descriptor is the console. It always is.
    pub fn is_console(_fd: usize) -> bool {
        true
    }

    /// Keyboard interrupt entry point, invoked by interrupt dispatch.
    pub fn keyboard_interrupt() {
        with_console(|console| console.keyboard_interrupt());
    }

    /// Serial interrupt entry point, invoked by interrupt dispatch.
    pub fn serial_interrupt() {
        with_console(|console| console.serial_interrupt());
    }

    /// Whether serial hardware was found at init.
    pub fn serial_present() -> bool {
        with_console(|console| console.serial_present())
    }

    /// Sets the display attribute for subsequent output.
    pub fn set_color(foreground: Color, background: Color) {
        with_console(|console| console.set_color(foreground, background));
    }

    /// Blanks the display and homes its cursor.
    pub fn clear_screen() {
        with_console(|console| console.clear_screen());
    }

    /// Internal print function used by the fan-out macros.
    #[doc(hidden)]
    pub fn _print(args: fmt::Arguments) {
        with_console(|console| {
            fmt::Write::write_fmt(console, args).expect("console write failed")
        });
    }

    /// Internal print function used by the serial-only macros.
    #[doc(hidden)]
    pub fn _serial_print(args: fmt::Arguments) {
        with_console(|console| {
            fmt::Write::write_fmt(&mut SerialSink(console), args).expect("serial write failed")
        });
    }
}

/// Prints to every console output device without a newline.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

/// Prints to every console output device with a newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)))
}

/// Prints to the serial line only, without a newline.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::console::_serial_print(format_args!($($arg)*))
    };
}

/// Prints to the serial line only, with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)))
}
