use bitflags::bitflags;

bitflags! {
    /// The modifier-key state of the keyboard.
    ///
    /// SHIFT, CTRL and ALT are momentary: set on key-down, cleared on the
    /// matching key-up. CAPS_LOCK, NUM_LOCK and SCROLL_LOCK are toggles:
    /// flipped on every key-down of the corresponding key. EXTENDED is not
    /// a key at all — it records that the 0xE0 extended-scancode prefix was
    /// seen and that the next scancode byte selects the extended table
    /// slots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Either shift key is held.
        const SHIFT       = 1 << 0;
        /// Either control key is held.
        const CTRL        = 1 << 1;
        /// Either alt key is held.
        const ALT         = 1 << 2;
        /// Caps Lock is engaged.
        const CAPS_LOCK   = 1 << 3;
        /// Num Lock is engaged.
        const NUM_LOCK    = 1 << 4;
        /// Scroll Lock is engaged.
        const SCROLL_LOCK = 1 << 5;
        /// A 0xE0 extended-scancode prefix is pending.
        const EXTENDED    = 1 << 6;
    }
}

impl Modifiers {
    /// Index into the four-entry layout table array: bit 0 is SHIFT and
    /// bit 1 is CTRL, so the indices are normal, shifted, ctrl, ctrl.
    pub const fn layout_index(self) -> usize {
        (self.bits() & (Self::SHIFT.bits() | Self::CTRL.bits())) as usize
    }

    /// Whether Ctrl and Alt are both held (the reset chord).
    pub const fn ctrl_alt_held(self) -> bool {
        self.bits() & (Self::CTRL.bits() | Self::ALT.bits())
            == Self::CTRL.bits() | Self::ALT.bits()
    }
}
