//! Kernel logging through the `log` facade.
//!
//! Records go to the serial line only: log output is for the developer on
//! the other end of the wire, and it must keep working while the display
//! is mid-scroll or showing a panic.

use log::{LevelFilter, Metadata, Record};

use crate::serial_println;

struct SerialLogger;

static LOGGER: SerialLogger = SerialLogger;

/// Installs the serial logger with an Info default level.
///
/// Later calls are no-ops; the first installation wins.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            serial_println!("[{:>5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}
