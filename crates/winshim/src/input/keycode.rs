//! Unified key codes and mouse buttons

/// Backend independent key code
///
/// The code space follows GLFW's layout: printable keys use their ASCII code
/// (32-96, letters upper case), function/navigation/editing keys live in
/// 256-301, the keypad in 320-336 and modifier/menu keys in 340-348. Native
/// keys without a mapping keep their raw numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Keycode(pub u32);

#[allow(missing_docs)]
impl Keycode {
    pub const SPACE: Self = Self(32);
    pub const APOSTROPHE: Self = Self(39);
    pub const COMMA: Self = Self(44);
    pub const MINUS: Self = Self(45);
    pub const PERIOD: Self = Self(46);
    pub const SLASH: Self = Self(47);
    pub const NUM_0: Self = Self(48);
    pub const NUM_1: Self = Self(49);
    pub const NUM_2: Self = Self(50);
    pub const NUM_3: Self = Self(51);
    pub const NUM_4: Self = Self(52);
    pub const NUM_5: Self = Self(53);
    pub const NUM_6: Self = Self(54);
    pub const NUM_7: Self = Self(55);
    pub const NUM_8: Self = Self(56);
    pub const NUM_9: Self = Self(57);
    pub const SEMICOLON: Self = Self(59);
    pub const EQUAL: Self = Self(61);
    pub const A: Self = Self(65);
    pub const B: Self = Self(66);
    pub const C: Self = Self(67);
    pub const D: Self = Self(68);
    pub const E: Self = Self(69);
    pub const F: Self = Self(70);
    pub const G: Self = Self(71);
    pub const H: Self = Self(72);
    pub const I: Self = Self(73);
    pub const J: Self = Self(74);
    pub const K: Self = Self(75);
    pub const L: Self = Self(76);
    pub const M: Self = Self(77);
    pub const N: Self = Self(78);
    pub const O: Self = Self(79);
    pub const P: Self = Self(80);
    pub const Q: Self = Self(81);
    pub const R: Self = Self(82);
    pub const S: Self = Self(83);
    pub const T: Self = Self(84);
    pub const U: Self = Self(85);
    pub const V: Self = Self(86);
    pub const W: Self = Self(87);
    pub const X: Self = Self(88);
    pub const Y: Self = Self(89);
    pub const Z: Self = Self(90);
    pub const LEFT_BRACKET: Self = Self(91);
    pub const BACKSLASH: Self = Self(92);
    pub const RIGHT_BRACKET: Self = Self(93);
    pub const GRAVE_ACCENT: Self = Self(96);

    pub const ESCAPE: Self = Self(256);
    pub const ENTER: Self = Self(257);
    pub const TAB: Self = Self(258);
    pub const BACKSPACE: Self = Self(259);
    pub const INSERT: Self = Self(260);
    pub const DELETE: Self = Self(261);
    pub const RIGHT: Self = Self(262);
    pub const LEFT: Self = Self(263);
    pub const DOWN: Self = Self(264);
    pub const UP: Self = Self(265);
    pub const PAGE_UP: Self = Self(266);
    pub const PAGE_DOWN: Self = Self(267);
    pub const HOME: Self = Self(268);
    pub const END: Self = Self(269);
    pub const CAPS_LOCK: Self = Self(280);
    pub const SCROLL_LOCK: Self = Self(281);
    pub const NUM_LOCK: Self = Self(282);
    pub const PRINT_SCREEN: Self = Self(283);
    pub const PAUSE: Self = Self(284);
    pub const F1: Self = Self(290);
    pub const F2: Self = Self(291);
    pub const F3: Self = Self(292);
    pub const F4: Self = Self(293);
    pub const F5: Self = Self(294);
    pub const F6: Self = Self(295);
    pub const F7: Self = Self(296);
    pub const F8: Self = Self(297);
    pub const F9: Self = Self(298);
    pub const F10: Self = Self(299);
    pub const F11: Self = Self(300);
    pub const F12: Self = Self(301);

    pub const KP_0: Self = Self(320);
    pub const KP_1: Self = Self(321);
    pub const KP_2: Self = Self(322);
    pub const KP_3: Self = Self(323);
    pub const KP_4: Self = Self(324);
    pub const KP_5: Self = Self(325);
    pub const KP_6: Self = Self(326);
    pub const KP_7: Self = Self(327);
    pub const KP_8: Self = Self(328);
    pub const KP_9: Self = Self(329);
    pub const KP_DECIMAL: Self = Self(330);
    pub const KP_DIVIDE: Self = Self(331);
    pub const KP_MULTIPLY: Self = Self(332);
    pub const KP_SUBTRACT: Self = Self(333);
    pub const KP_ADD: Self = Self(334);
    pub const KP_ENTER: Self = Self(335);
    pub const KP_EQUAL: Self = Self(336);

    pub const LEFT_SHIFT: Self = Self(340);
    pub const LEFT_CONTROL: Self = Self(341);
    pub const LEFT_ALT: Self = Self(342);
    pub const LEFT_SUPER: Self = Self(343);
    pub const RIGHT_SHIFT: Self = Self(344);
    pub const RIGHT_CONTROL: Self = Self(345);
    pub const RIGHT_ALT: Self = Self(346);
    pub const RIGHT_SUPER: Self = Self(347);
    pub const MENU: Self = Self(348);
}

impl Keycode {
    /// Raw numeric value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is one of the eight left/right modifier keys
    pub const fn is_modifier(self) -> bool {
        self.0 >= Self::LEFT_SHIFT.0 && self.0 <= Self::RIGHT_SUPER.0
    }
}

/// Translate a GLFW key code
///
/// The unified space uses GLFW's numbering, so every mapped key keeps its
/// value and unmapped keys pass through unchanged. `GLFW_KEY_UNKNOWN` (-1)
/// is rejected by the key handler before it gets here.
#[allow(clippy::cast_sign_loss)]
pub const fn translate_glfw_key(code: i32) -> Keycode {
    Keycode(code as u32)
}

/// Mouse button index, 0 = left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseButton(pub i32);

impl MouseButton {
    /// Left button
    pub const LEFT: Self = Self(0);
    /// Right button
    pub const RIGHT: Self = Self(1);
    /// Middle button
    pub const MIDDLE: Self = Self(2);

    /// Map an X11 core button number (1 = left, 2 = middle, 3 = right)
    ///
    /// Wheel buttons 4-7 are handled as scroll input and never reach here.
    /// Buttons 8 and 9 (back/forward) become the fourth and fifth button.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_x11(button: u32) -> Self {
        match button {
            1 => Self::LEFT,
            2 => Self::MIDDLE,
            3 => Self::RIGHT,
            8 => Self(3),
            9 => Self(4),
            other => Self(other as i32 - 1),
        }
    }
}
