//! PS/2 keyboard scancode decoding.
//!
//! The keyboard delivers one byte per key edge: bit 7 distinguishes press
//! from release, and a 0xE0 prefix byte promotes the following code into the
//! extended set (arrows, the navigation block, the right-hand modifier
//! keys). [`KeyDecoder`] folds that stream into logical characters through
//! four fixed layout tables selected by the live modifier state.

use kaiku_common::{keys, Modifiers};
use kaiku_hal::PortBus;

/// Keyboard controller status port.
const STATUS_PORT: u16 = 0x64;
/// Keyboard controller data port.
const DATA_PORT: u16 = 0x60;
/// Status bit: a byte is waiting in the output buffer.
const STATUS_DATA_READY: u8 = 0x01;

/// Prefix byte announcing an extended scancode.
const EXTENDED_PREFIX: u8 = 0xE0;
/// Scancode bit distinguishing key release from key press.
const RELEASE_BIT: u8 = 0x80;

/// System control port used for the Ctrl+Alt+Delete reset.
const RESET_PORT: u16 = 0x92;
/// Reset command: fast A20 + system reset bits.
const RESET_COMMAND: u8 = 0x03;

/// Table sentinel for scancodes with no mapping.
const NO: u8 = 0;

/// Reads one scancode from the keyboard controller, if one is waiting.
pub fn poll_scancode(bus: &mut impl PortBus) -> Option<u8> {
    if bus.read(STATUS_PORT) & STATUS_DATA_READY == 0 {
        return None;
    }
    Some(bus.read(DATA_PORT))
}

/// Outcome of feeding one scancode byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// The byte only updated decoder state (prefix, release, modifier) or
    /// mapped to nothing; no character is delivered.
    Ignored,
    /// A logical character or key code for the input buffer.
    Char(u8),
    /// The Ctrl+Alt+Delete chord; the reset command has been issued.
    Reset,
}

/// The scancode state machine.
///
/// Holds the modifier state that persists between bytes. Access must be
/// single-threaded; the console facade serializes the interrupt and polling
/// callers.
pub struct KeyDecoder {
    modifiers: Modifiers,
}

impl KeyDecoder {
    /// Creates a decoder with no modifiers engaged.
    pub const fn new() -> Self {
        KeyDecoder {
            modifiers: Modifiers::empty(),
        }
    }

    /// Current modifier state.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Decodes one raw scancode byte.
    ///
    /// `bus` is only touched for the Ctrl+Alt+Delete side effect: one write
    /// of the reset command to the system control port.
    pub fn decode(&mut self, bus: &mut impl PortBus, raw: u8) -> Decoded {
        if raw == EXTENDED_PREFIX {
            self.modifiers.insert(Modifiers::EXTENDED);
            return Decoded::Ignored;
        }

        if raw & RELEASE_BIT != 0 {
            // An extended release already carries its table slot in the high
            // bit; a plain release must be masked back to the press code.
            let code = if self.modifiers.contains(Modifiers::EXTENDED) {
                raw
            } else {
                raw & !RELEASE_BIT
            };
            let held = Modifiers::from_bits_truncate(MOMENTARY[code as usize]);
            self.modifiers.remove(held | Modifiers::EXTENDED);
            return Decoded::Ignored;
        }

        let mut code = raw;
        if self.modifiers.contains(Modifiers::EXTENDED) {
            code |= RELEASE_BIT;
            self.modifiers.remove(Modifiers::EXTENDED);
        }

        self.modifiers
            .insert(Modifiers::from_bits_truncate(MOMENTARY[code as usize]));
        self.modifiers
            .toggle(Modifiers::from_bits_truncate(TOGGLE[code as usize]));

        let mut value = LAYOUTS[self.modifiers.layout_index()][code as usize];
        if self.modifiers.contains(Modifiers::CAPS_LOCK) {
            value = swap_case(value);
        }

        if self.modifiers.ctrl_alt_held() && value == keys::DELETE {
            bus.write(RESET_PORT, RESET_COMMAND);
            return Decoded::Reset;
        }

        if value == NO {
            Decoded::Ignored
        } else {
            Decoded::Char(value)
        }
    }
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Swaps the case of ASCII letters; everything else passes through.
fn swap_case(value: u8) -> u8 {
    match value {
        b'a'..=b'z' => value - (b'a' - b'A'),
        b'A'..=b'Z' => value + (b'a' - b'A'),
        _ => value,
    }
}

/// Control code for a key, as the wrapped distance from `@`.
///
/// Wrapping reproduces the historical table contents exactly, including the
/// out-of-range value this produces for Ctrl+`/`.
const fn ctl(c: u8) -> u8 {
    c.wrapping_sub(b'@')
}

/// Builds a 256-entry table from a dense base plus sparse overrides.
///
/// Every override must land on a still-unmapped slot; a collision aborts
/// compilation, so no table can silently shadow an earlier entry.
const fn table(base: &[u8], overrides: &[(u8, u8)]) -> [u8; 256] {
    let mut map = [NO; 256];
    let mut i = 0;
    while i < base.len() {
        map[i] = base[i];
        i += 1;
    }
    let mut j = 0;
    while j < overrides.len() {
        let (code, value) = (overrides[j].0 as usize, overrides[j].1);
        assert!(map[code] == NO, "scancode mapped twice");
        map[code] = value;
        j += 1;
    }
    map
}

/// Extended-slot keys shared by the unshifted and shifted layouts: the
/// navigation block plus keypad Enter and keypad divide.
const NAV_OVERRIDES: [(u8, u8); 12] = [
    (0x9C, b'\n'), // keypad Enter
    (0xB5, b'/'),  // keypad divide
    (0xC7, keys::HOME),
    (0xC8, keys::UP),
    (0xC9, keys::PAGE_UP),
    (0xCB, keys::LEFT),
    (0xCD, keys::RIGHT),
    (0xCF, keys::END),
    (0xD0, keys::DOWN),
    (0xD1, keys::PAGE_DOWN),
    (0xD2, keys::INSERT),
    (0xD3, keys::DELETE),
];

#[rustfmt::skip]
const NORMAL_BASE: [u8; 0x58] = [
    NO,    0x1B,  b'1',  b'2',  b'3',  b'4',  b'5',  b'6',  // 0x00
    b'7',  b'8',  b'9',  b'0',  b'-',  b'=',  0x08,  b'\t',
    b'q',  b'w',  b'e',  b'r',  b't',  b'y',  b'u',  b'i',  // 0x10
    b'o',  b'p',  b'[',  b']',  b'\n', NO,    b'a',  b's',
    b'd',  b'f',  b'g',  b'h',  b'j',  b'k',  b'l',  b';',  // 0x20
    b'\'', b'`',  NO,    b'\\', b'z',  b'x',  b'c',  b'v',
    b'b',  b'n',  b'm',  b',',  b'.',  b'/',  NO,    b'*',  // 0x30
    NO,    b' ',  NO,    NO,    NO,    NO,    NO,    NO,
    NO,    NO,    NO,    NO,    NO,    NO,    NO,    b'7',  // 0x40
    b'8',  b'9',  b'-',  b'4',  b'5',  b'6',  b'+',  b'1',
    b'2',  b'3',  b'0',  b'.',  NO,    NO,    NO,    NO,    // 0x50
];

#[rustfmt::skip]
const SHIFT_BASE: [u8; 0x58] = [
    NO,    0x1B,  b'!',  b'@',  b'#',  b'$',  b'%',  b'^',  // 0x00
    b'&',  b'*',  b'(',  b')',  b'_',  b'+',  0x08,  b'\t',
    b'Q',  b'W',  b'E',  b'R',  b'T',  b'Y',  b'U',  b'I',  // 0x10
    b'O',  b'P',  b'{',  b'}',  b'\n', NO,    b'A',  b'S',
    b'D',  b'F',  b'G',  b'H',  b'J',  b'K',  b'L',  b':',  // 0x20
    b'"',  b'~',  NO,    b'|',  b'Z',  b'X',  b'C',  b'V',
    b'B',  b'N',  b'M',  b'<',  b'>',  b'?',  NO,    b'*',  // 0x30
    NO,    b' ',  NO,    NO,    NO,    NO,    NO,    NO,
    NO,    NO,    NO,    NO,    NO,    NO,    NO,    b'7',  // 0x40
    b'8',  b'9',  b'-',  b'4',  b'5',  b'6',  b'+',  b'1',
    b'2',  b'3',  b'0',  b'.',  NO,    NO,    NO,    NO,    // 0x50
];

#[rustfmt::skip]
const CTRL_BASE: [u8; 0x38] = [
    NO,        NO,        NO,        NO,        NO,        NO,        NO,        NO,
    NO,        NO,        NO,        NO,        NO,        NO,        NO,        NO,
    ctl(b'Q'), ctl(b'W'), ctl(b'E'), ctl(b'R'), ctl(b'T'), ctl(b'Y'), ctl(b'U'), ctl(b'I'),
    ctl(b'O'), ctl(b'P'), NO,        NO,        b'\r',     NO,        ctl(b'A'), ctl(b'S'),
    ctl(b'D'), ctl(b'F'), ctl(b'G'), ctl(b'H'), ctl(b'J'), ctl(b'K'), ctl(b'L'), NO,
    NO,        NO,        NO,        ctl(b'\\'), ctl(b'Z'), ctl(b'X'), ctl(b'C'), ctl(b'V'),
    ctl(b'B'), ctl(b'N'), ctl(b'M'), NO,        NO,        ctl(b'/'), NO,        NO,
];

const NORMAL_MAP: [u8; 256] = table(&NORMAL_BASE, &NAV_OVERRIDES);
const SHIFT_MAP: [u8; 256] = table(&SHIFT_BASE, &NAV_OVERRIDES);
const CTRL_MAP: [u8; 256] = table(
    &CTRL_BASE,
    &[
        (0x97, keys::HOME),
        (0xB5, ctl(b'/')),
        (0xC8, keys::UP),
        (0xC9, keys::PAGE_UP),
        (0xCB, keys::LEFT),
        (0xCD, keys::RIGHT),
        (0xCF, keys::END),
        (0xD0, keys::DOWN),
        (0xD1, keys::PAGE_DOWN),
        (0xD2, keys::INSERT),
        (0xD3, keys::DELETE),
    ],
);

/// Layout tables indexed by `Modifiers::layout_index` (Ctrl wins over
/// Shift, so the Ctrl table appears twice).
static LAYOUTS: [&[u8; 256]; 4] = [&NORMAL_MAP, &SHIFT_MAP, &CTRL_MAP, &CTRL_MAP];

/// Scancode to momentary-modifier bits (left/right Ctrl, Shift, Alt).
const MOMENTARY: [u8; 256] = table(
    &[],
    &[
        (0x1D, Modifiers::CTRL.bits()),
        (0x2A, Modifiers::SHIFT.bits()),
        (0x36, Modifiers::SHIFT.bits()),
        (0x38, Modifiers::ALT.bits()),
        (0x9D, Modifiers::CTRL.bits()),
        (0xB8, Modifiers::ALT.bits()),
    ],
);

/// Scancode to toggle-modifier bits (the lock keys).
const TOGGLE: [u8; 256] = table(
    &[],
    &[
        (0x3A, Modifiers::CAPS_LOCK.bits()),
        (0x45, Modifiers::NUM_LOCK.bits()),
        (0x46, Modifiers::SCROLL_LOCK.bits()),
    ],
);

#[cfg(test)]
mod tests {
    use super::super::mock::FakeBus;
    use super::*;

    fn decode_all(decoder: &mut KeyDecoder, bus: &mut FakeBus, bytes: &[u8]) -> Decoded {
        let mut last = Decoded::Ignored;
        for &byte in bytes {
            last = decoder.decode(bus, byte);
        }
        last
    }

    #[test]
    fn plain_press_decodes_lowercase() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'a'));
    }

    #[test]
    fn release_produces_no_character() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        decoder.decode(&mut bus, 0x1E);
        assert_eq!(decoder.decode(&mut bus, 0x9E), Decoded::Ignored);
    }

    #[test]
    fn shift_selects_the_shifted_table() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        assert_eq!(decoder.decode(&mut bus, 0x2A), Decoded::Ignored);
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'A'));
        // Releasing shift reverts to the unshifted table.
        assert_eq!(decoder.decode(&mut bus, 0xAA), Decoded::Ignored);
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'a'));
    }

    #[test]
    fn caps_lock_swaps_letter_case_only() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        // Press and release Caps Lock, then 'a' and '1'.
        decode_all(&mut decoder, &mut bus, &[0x3A, 0xBA]);
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'A'));
        assert_eq!(decoder.decode(&mut bus, 0x02), Decoded::Char(b'1'));
        // Toggling again reverts.
        decode_all(&mut decoder, &mut bus, &[0x3A, 0xBA]);
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'a'));
    }

    #[test]
    fn caps_lock_and_shift_cancel_out() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        decode_all(&mut decoder, &mut bus, &[0x3A, 0xBA, 0x2A]);
        assert_eq!(decoder.decode(&mut bus, 0x1E), Decoded::Char(b'a'));
    }

    #[test]
    fn ctrl_maps_to_control_codes() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        decoder.decode(&mut bus, 0x1D);
        assert_eq!(decoder.decode(&mut bus, 0x2E), Decoded::Char(0x03)); // Ctrl+C
    }

    #[test]
    fn extended_prefix_selects_extended_slots() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        assert_eq!(decoder.decode(&mut bus, 0xE0), Decoded::Ignored);
        assert_eq!(decoder.decode(&mut bus, 0x48), Decoded::Char(keys::UP));
        // The prefix is consumed: the same code now means keypad '8'.
        assert_eq!(decoder.decode(&mut bus, 0x48), Decoded::Char(b'8'));
    }

    #[test]
    fn extended_release_clears_extended_modifier() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        // Right Ctrl press is E0 1D, release is E0 9D.
        decode_all(&mut decoder, &mut bus, &[0xE0, 0x1D]);
        assert!(decoder.modifiers().contains(Modifiers::CTRL));
        decode_all(&mut decoder, &mut bus, &[0xE0, 0x9D]);
        assert!(decoder.modifiers().is_empty());
    }

    #[test]
    fn unmapped_scancode_is_ignored() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        assert_eq!(decoder.decode(&mut bus, 0x54), Decoded::Ignored);
    }

    #[test]
    fn ctrl_alt_delete_issues_exactly_one_reset() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        // Ctrl down, Alt down, then extended Delete.
        let outcome = decode_all(&mut decoder, &mut bus, &[0x1D, 0x38, 0xE0, 0x53]);
        assert_eq!(outcome, Decoded::Reset);
        assert_eq!(reset_writes(&bus), 1);
    }

    fn reset_writes(bus: &FakeBus) -> usize {
        bus.writes()
            .iter()
            .filter(|&&(port, value)| port == RESET_PORT && value == RESET_COMMAND)
            .count()
    }

    #[test]
    fn plain_delete_scancode_does_not_reset() {
        let mut decoder = KeyDecoder::new();
        let mut bus = FakeBus::new();
        // Without the extended prefix, 0x53 is keypad '.' in the ctrl table
        // slot and maps to nothing.
        let outcome = decode_all(&mut decoder, &mut bus, &[0x1D, 0x38, 0x53]);
        assert_eq!(outcome, Decoded::Ignored);
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn poll_reports_no_data_when_status_clear() {
        let mut bus = FakeBus::new();
        assert_eq!(poll_scancode(&mut bus), None);
        bus.script_read(STATUS_PORT, STATUS_DATA_READY);
        bus.script_read(DATA_PORT, 0x1E);
        assert_eq!(poll_scancode(&mut bus), Some(0x1E));
    }
}
