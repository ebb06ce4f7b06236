//! Left/right modifier tracking

use bitflags::bitflags;

use super::Keycode;

bitflags! {
    /// Unified modifier bitmask with separate left and right bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Left shift
        const LSHIFT = 1 << 0;
        /// Right shift
        const RSHIFT = 1 << 1;
        /// Left control
        const LCTRL = 1 << 2;
        /// Right control
        const RCTRL = 1 << 3;
        /// Left alt
        const LALT = 1 << 4;
        /// Right alt
        const RALT = 1 << 5;
        /// Left super
        const LSUPER = 1 << 6;
        /// Right super
        const RSUPER = 1 << 7;

        /// Either shift
        const SHIFT = Self::LSHIFT.bits() | Self::RSHIFT.bits();
        /// Either control
        const CTRL = Self::LCTRL.bits() | Self::RCTRL.bits();
        /// Either alt
        const ALT = Self::LALT.bits() | Self::RALT.bits();
        /// Either super
        const SUPER = Self::LSUPER.bits() | Self::RSUPER.bits();
    }
}

bitflags! {
    /// Merged per-family modifier bits as reported by the native layer
    ///
    /// The values match GLFW's `GLFW_MOD_*` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NativeModifiers: u8 {
        /// Shift held on either side
        const SHIFT = 0x01;
        /// Control held on either side
        const CONTROL = 0x02;
        /// Alt held on either side
        const ALT = 0x04;
        /// Super held on either side
        const SUPER = 0x08;
    }
}

impl NativeModifiers {
    /// Decode an X11 core event `state` field
    pub const fn from_x11_state(state: u32) -> Self {
        const SHIFT_MASK: u32 = 1 << 0;
        const CONTROL_MASK: u32 = 1 << 2;
        const MOD1_MASK: u32 = 1 << 3;
        const MOD4_MASK: u32 = 1 << 6;

        let mut bits = 0;
        if state & SHIFT_MASK != 0 {
            bits |= Self::SHIFT.bits();
        }
        if state & CONTROL_MASK != 0 {
            bits |= Self::CONTROL.bits();
        }
        if state & MOD1_MASK != 0 {
            bits |= Self::ALT.bits();
        }
        if state & MOD4_MASK != 0 {
            bits |= Self::SUPER.bits();
        }
        Self::from_bits_truncate(bits)
    }
}

/// Native family bit and the unified bits of both sides
const FAMILIES: [(NativeModifiers, Modifiers); 4] = [
    (NativeModifiers::SHIFT, Modifiers::SHIFT),
    (NativeModifiers::CONTROL, Modifiers::CTRL),
    (NativeModifiers::ALT, Modifiers::ALT),
    (NativeModifiers::SUPER, Modifiers::SUPER),
];

const fn side_bit(keycode: Keycode) -> Option<Modifiers> {
    match keycode {
        Keycode::LEFT_SHIFT => Some(Modifiers::LSHIFT),
        Keycode::RIGHT_SHIFT => Some(Modifiers::RSHIFT),
        Keycode::LEFT_CONTROL => Some(Modifiers::LCTRL),
        Keycode::RIGHT_CONTROL => Some(Modifiers::RCTRL),
        Keycode::LEFT_ALT => Some(Modifiers::LALT),
        Keycode::RIGHT_ALT => Some(Modifiers::RALT),
        Keycode::LEFT_SUPER => Some(Modifiers::LSUPER),
        Keycode::RIGHT_SUPER => Some(Modifiers::RSUPER),
        _ => None,
    }
}

/// Remembers which side of each modifier family is held
///
/// The native layers only say "shift is down", so the side is recovered from
/// the modifier key events seen so far. The native bit stays authoritative:
/// a family the native layer reports as released is cleared on both sides
/// even if a key-up was missed (focus changes, grabs).
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierTracker {
    held: Modifiers,
}

impl ModifierTracker {
    /// Create a tracker with nothing held
    pub const fn new() -> Self {
        Self { held: Modifiers::empty() }
    }

    /// Record a key transition; non-modifier keys are ignored
    pub fn track(&mut self, keycode: Keycode, pressed: bool) {
        if !keycode.is_modifier() {
            return;
        }
        if let Some(bit) = side_bit(keycode) {
            self.held.set(bit, pressed);
        }
    }

    /// Combine merged native bits with the tracked sides
    pub fn translate(&self, native: NativeModifiers) -> Modifiers {
        let mut result = Modifiers::empty();
        for (family, mask) in FAMILIES {
            if native.contains(family) {
                result |= self.held & mask;
            }
        }
        result
    }

    /// Forget all tracked state
    pub fn reset(&mut self) {
        self.held = Modifiers::empty();
    }

    /// Side bits currently believed to be held
    pub const fn held(&self) -> Modifiers {
        self.held
    }
}
