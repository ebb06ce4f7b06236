//! X11 keysym table

use super::Keycode;

/// Named keysyms with a unified counterpart
const KEYSYMS: &[(u64, Keycode)] = &[
    (0xff1b, Keycode::ESCAPE),
    (0xff0d, Keycode::ENTER),
    (0xff09, Keycode::TAB),
    (0xff08, Keycode::BACKSPACE),
    (0xff63, Keycode::INSERT),
    (0xffff, Keycode::DELETE),
    (0xff53, Keycode::RIGHT),
    (0xff51, Keycode::LEFT),
    (0xff54, Keycode::DOWN),
    (0xff52, Keycode::UP),
    (0xff55, Keycode::PAGE_UP),
    (0xff56, Keycode::PAGE_DOWN),
    (0xff50, Keycode::HOME),
    (0xff57, Keycode::END),
    (0xffe5, Keycode::CAPS_LOCK),
    (0xff14, Keycode::SCROLL_LOCK),
    (0xff7f, Keycode::NUM_LOCK),
    (0xff61, Keycode::PRINT_SCREEN),
    (0xff13, Keycode::PAUSE),
    (0xffae, Keycode::KP_DECIMAL),
    (0xffaf, Keycode::KP_DIVIDE),
    (0xffaa, Keycode::KP_MULTIPLY),
    (0xffad, Keycode::KP_SUBTRACT),
    (0xffab, Keycode::KP_ADD),
    (0xff8d, Keycode::KP_ENTER),
    (0xffbd, Keycode::KP_EQUAL),
    (0xffe1, Keycode::LEFT_SHIFT),
    (0xffe3, Keycode::LEFT_CONTROL),
    (0xffe9, Keycode::LEFT_ALT),
    (0xffeb, Keycode::LEFT_SUPER),
    (0xffe2, Keycode::RIGHT_SHIFT),
    (0xffe4, Keycode::RIGHT_CONTROL),
    (0xffea, Keycode::RIGHT_ALT),
    (0xffec, Keycode::RIGHT_SUPER),
    (0xff67, Keycode::MENU),
];

const XK_F1: u64 = 0xffbe;
const XK_F12: u64 = 0xffc9;
const XK_KP_0: u64 = 0xffb0;
const XK_KP_9: u64 = 0xffb9;

/// Translate an X11 keysym
///
/// Latin-1 printable keysyms share their ASCII value with the unified code;
/// lower-case letters fold onto the upper-case code so that `XK_a` and
/// `XK_A` both report [`Keycode::A`]. Anything unknown passes through raw.
#[allow(clippy::cast_possible_truncation)]
pub fn translate_x11_keysym(sym: u64) -> Keycode {
    match sym {
        0x61..=0x7a => Keycode((sym - 0x20) as u32),
        0x20..=0x60 => Keycode(sym as u32),
        XK_F1..=XK_F12 => Keycode(Keycode::F1.0 + (sym - XK_F1) as u32),
        XK_KP_0..=XK_KP_9 => Keycode(Keycode::KP_0.0 + (sym - XK_KP_0) as u32),
        _ => KEYSYMS
            .iter()
            .find(|&&(native, _)| native == sym)
            .map_or(Keycode(sym as u32), |&(_, code)| code),
    }
}
