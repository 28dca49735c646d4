//! Text-mode display output.
//!
//! The display is an 80x25 grid of glyph/attribute cells in one of two
//! memory-mapped windows: color adapters decode 0xB8000, monochrome
//! adapters 0xB0000, each with its own CRT controller port pair. Which one
//! is present is discovered at init by probing the color window for
//! writable memory. The cursor is a single linear offset mirrored into the
//! CRT controller after every change.

use kaiku_hal::{PortBus, VideoMem};

/// Columns per row.
pub const COLUMNS: usize = 80;
/// Visible rows.
pub const ROWS: usize = 25;
/// Visible cells.
const SCREEN_CELLS: usize = COLUMNS * ROWS;

/// Cell index of the monochrome window (0xB0000) in the text region.
pub(crate) const MONO_BASE_CELL: usize = 0;
/// Cell index of the color window (0xB8000) in the text region.
pub(crate) const COLOR_BASE_CELL: usize = 0x4000;

/// CRT controller index port of a monochrome adapter.
const MONO_CRT_PORT: u16 = 0x3B4;
/// CRT controller index port of a color adapter.
const COLOR_CRT_PORT: u16 = 0x3D4;

/// CRT controller register: cursor offset high byte.
const CURSOR_HIGH: u8 = 14;
/// CRT controller register: cursor offset low byte.
const CURSOR_LOW: u8 = 15;

/// Pattern written during the writable-memory probe.
const PROBE_PATTERN: u16 = 0xA55A;

/// Columns per tab stop.
const TAB_STOP: usize = 8;

/// Standard 16-color text-mode palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    /// Black color.
    Black = 0,
    /// Blue color.
    Blue = 1,
    /// Green color.
    Green = 2,
    /// Cyan color.
    Cyan = 3,
    /// Red color.
    Red = 4,
    /// Magenta color.
    Magenta = 5,
    /// Brown color.
    Brown = 6,
    /// Light gray color.
    LightGray = 7,
    /// Dark gray color.
    DarkGray = 8,
    /// Light blue color.
    LightBlue = 9,
    /// Light green color.
    LightGreen = 10,
    /// Light cyan color.
    LightCyan = 11,
    /// Light red color.
    LightRed = 12,
    /// Pink color.
    Pink = 13,
    /// Yellow color.
    Yellow = 14,
    /// White color.
    White = 15,
}

/// Combined foreground and background attribute byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
struct ColorCode(u8);

impl ColorCode {
    const fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode((background as u8) << 4 | (foreground as u8))
    }
}

/// The memory-mapped text display.
pub struct Display {
    base_cell: usize,
    crt_port: u16,
    cursor: u16,
    color: ColorCode,
}

impl Display {
    /// Creates a display assuming the color window until `init` probes.
    pub const fn new() -> Self {
        Display {
            base_cell: COLOR_BASE_CELL,
            crt_port: COLOR_CRT_PORT,
            cursor: 0,
            color: ColorCode::new(Color::White, Color::Black),
        }
    }

    /// Probes for the backing window and reads the hardware cursor.
    pub fn init(&mut self, video: &mut impl VideoMem, bus: &mut impl PortBus) {
        let saved = video.load(COLOR_BASE_CELL);
        video.store(COLOR_BASE_CELL, PROBE_PATTERN);
        if video.load(COLOR_BASE_CELL) != PROBE_PATTERN {
            self.base_cell = MONO_BASE_CELL;
            self.crt_port = MONO_CRT_PORT;
        } else {
            video.store(COLOR_BASE_CELL, saved);
            self.base_cell = COLOR_BASE_CELL;
            self.crt_port = COLOR_CRT_PORT;
        }

        // extract the cursor location
        bus.write(self.crt_port, CURSOR_HIGH);
        let mut pos = (bus.read(self.crt_port + 1) as u16) << 8;
        bus.write(self.crt_port, CURSOR_LOW);
        pos |= bus.read(self.crt_port + 1) as u16;

        // hardware may report a cursor past the visible area
        if pos as usize >= SCREEN_CELLS {
            pos = 0;
        }
        self.cursor = pos;
    }

    /// Whether the probe selected the color window.
    pub fn is_color(&self) -> bool {
        self.base_cell == COLOR_BASE_CELL
    }

    /// Sets the attribute applied to subsequently written glyphs.
    pub fn set_color(&mut self, foreground: Color, background: Color) {
        self.color = ColorCode::new(foreground, background);
    }

    /// Writes one byte at the cursor.
    ///
    /// Backspace blanks the previous cell, `\n` moves to the start of the
    /// next row, `\r` returns to the start of the current row, and tab
    /// advances to the next stop; everything else is stored as a glyph.
    /// Passing the last row scrolls the screen up one row and clears the
    /// bottom; the hardware cursor follows every change.
    pub fn put_char(&mut self, video: &mut impl VideoMem, bus: &mut impl PortBus, byte: u8) {
        match byte {
            0x08 => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.store_glyph(video, b' ');
                }
            }
            b'\n' => {
                self.cursor += COLUMNS as u16;
                self.cursor -= self.cursor % COLUMNS as u16;
            }
            b'\r' => {
                self.cursor -= self.cursor % COLUMNS as u16;
            }
            b'\t' => loop {
                self.store_glyph(video, b' ');
                self.cursor += 1;
                if self.cursor as usize % TAB_STOP == 0 {
                    break;
                }
            },
            _ => {
                self.store_glyph(video, byte);
                self.cursor += 1;
            }
        }

        if self.cursor as usize >= SCREEN_CELLS {
            self.scroll(video);
        }
        self.sync_cursor(bus);
    }

    /// Blanks the whole screen and homes the cursor.
    pub fn clear_screen(&mut self, video: &mut impl VideoMem, bus: &mut impl PortBus) {
        let blank = self.blank_cell();
        for cell in 0..SCREEN_CELLS {
            video.store(self.base_cell + cell, blank);
        }
        self.cursor = 0;
        self.sync_cursor(bus);
    }

    fn store_glyph(&mut self, video: &mut impl VideoMem, byte: u8) {
        let cell = (self.color.0 as u16) << 8 | byte as u16;
        video.store(self.base_cell + self.cursor as usize, cell);
    }

    fn scroll(&mut self, video: &mut impl VideoMem) {
        for cell in COLUMNS..SCREEN_CELLS {
            let value = video.load(self.base_cell + cell);
            video.store(self.base_cell + cell - COLUMNS, value);
        }
        let blank = self.blank_cell();
        for cell in SCREEN_CELLS - COLUMNS..SCREEN_CELLS {
            video.store(self.base_cell + cell, blank);
        }
        self.cursor -= COLUMNS as u16;
    }

    fn blank_cell(&self) -> u16 {
        (self.color.0 as u16) << 8 | b' ' as u16
    }

    fn sync_cursor(&mut self, bus: &mut impl PortBus) {
        bus.write(self.crt_port, CURSOR_HIGH);
        bus.write(self.crt_port + 1, (self.cursor >> 8) as u8);
        bus.write(self.crt_port, CURSOR_LOW);
        bus.write(self.crt_port + 1, self.cursor as u8);
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{FakeBus, FakeVideo};
    use super::*;

    fn init_color() -> (Display, FakeVideo, FakeBus) {
        let mut display = Display::new();
        let mut video = FakeVideo::new();
        let mut bus = FakeBus::new();
        display.init(&mut video, &mut bus);
        (display, video, bus)
    }

    #[test]
    fn probe_selects_color_and_restores_the_cell() {
        let mut display = Display::new();
        let mut video = FakeVideo::new();
        let mut bus = FakeBus::new();
        video.store_raw(COLOR_BASE_CELL, 0x0741);
        display.init(&mut video, &mut bus);

        assert!(display.is_color());
        assert_eq!(video.load_raw(COLOR_BASE_CELL), 0x0741);
    }

    #[test]
    fn probe_falls_back_to_mono() {
        let mut display = Display::new();
        let mut video = FakeVideo::unbacked_color();
        let mut bus = FakeBus::new();
        display.init(&mut video, &mut bus);
        assert!(!display.is_color());
    }

    #[test]
    fn init_reads_the_hardware_cursor() {
        let mut display = Display::new();
        let mut video = FakeVideo::new();
        let mut bus = FakeBus::new();
        // Cursor at row 2, column 5 = offset 165.
        bus.script_read(COLOR_CRT_PORT + 1, 0);
        bus.script_read(COLOR_CRT_PORT + 1, 165);
        display.init(&mut video, &mut bus);
        assert_eq!(display.cursor, 165);
    }

    #[test]
    fn bogus_hardware_cursor_resets_to_origin() {
        let mut display = Display::new();
        let mut video = FakeVideo::new();
        let mut bus = FakeBus::new();
        bus.script_read(COLOR_CRT_PORT + 1, 0xFF);
        bus.script_read(COLOR_CRT_PORT + 1, 0xFF);
        display.init(&mut video, &mut bus);
        assert_eq!(display.cursor, 0);
    }

    #[test]
    fn glyphs_advance_and_carry_the_attribute() {
        let (mut display, mut video, mut bus) = init_color();
        display.put_char(&mut video, &mut bus, b'h');
        display.put_char(&mut video, &mut bus, b'i');

        assert_eq!(video.load_raw(COLOR_BASE_CELL), 0x0700 | b'h' as u16);
        assert_eq!(video.load_raw(COLOR_BASE_CELL + 1), 0x0700 | b'i' as u16);
        assert_eq!(display.cursor, 2);
    }

    #[test]
    fn newline_moves_to_the_next_row_start() {
        let (mut display, mut video, mut bus) = init_color();
        display.put_char(&mut video, &mut bus, b'a');
        display.put_char(&mut video, &mut bus, b'\n');
        assert_eq!(display.cursor as usize, COLUMNS);
    }

    #[test]
    fn backspace_blanks_the_previous_cell() {
        let (mut display, mut video, mut bus) = init_color();
        display.put_char(&mut video, &mut bus, b'a');
        display.put_char(&mut video, &mut bus, 0x08);
        assert_eq!(display.cursor, 0);
        assert_eq!(video.load_raw(COLOR_BASE_CELL), 0x0700 | b' ' as u16);
        // At the origin, backspace stays put.
        display.put_char(&mut video, &mut bus, 0x08);
        assert_eq!(display.cursor, 0);
    }

    #[test]
    fn tab_advances_to_the_next_stop() {
        let (mut display, mut video, mut bus) = init_color();
        display.put_char(&mut video, &mut bus, b'a');
        display.put_char(&mut video, &mut bus, b'\t');
        assert_eq!(display.cursor as usize, TAB_STOP);
        assert_eq!(video.load_raw(COLOR_BASE_CELL + 1), 0x0700 | b' ' as u16);
    }

    #[test]
    fn long_lines_wrap() {
        let (mut display, mut video, mut bus) = init_color();
        for _ in 0..COLUMNS + 1 {
            display.put_char(&mut video, &mut bus, b'x');
        }
        assert_eq!(display.cursor as usize, COLUMNS + 1);
        assert_eq!(
            video.load_raw(COLOR_BASE_CELL + COLUMNS),
            0x0700 | b'x' as u16
        );
    }

    #[test]
    fn passing_the_last_row_scrolls_one_row() {
        let (mut display, mut video, mut bus) = init_color();
        display.clear_screen(&mut video, &mut bus);
        display.put_char(&mut video, &mut bus, b'q');
        // A newline per row pushes the cursor past the end once.
        for _ in 0..ROWS {
            display.put_char(&mut video, &mut bus, b'\n');
        }
        assert_eq!(display.cursor as usize, SCREEN_CELLS - COLUMNS);
        // The first row (holding 'q') scrolled off; the bottom row is clear.
        assert_eq!(video.load_raw(COLOR_BASE_CELL), 0x0700 | b' ' as u16);
        assert_eq!(
            video.load_raw(COLOR_BASE_CELL + SCREEN_CELLS - COLUMNS),
            0x0700 | b' ' as u16
        );
    }

    #[test]
    fn cursor_is_mirrored_to_the_crt_controller() {
        let (mut display, mut video, mut bus) = init_color();
        display.put_char(&mut video, &mut bus, b'a');

        let writes = bus.writes();
        let tail = &writes[writes.len() - 4..];
        assert_eq!(
            tail,
            &[
                (COLOR_CRT_PORT, CURSOR_HIGH),
                (COLOR_CRT_PORT + 1, 0),
                (COLOR_CRT_PORT, CURSOR_LOW),
                (COLOR_CRT_PORT + 1, 1),
            ]
        );
    }
}
