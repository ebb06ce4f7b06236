//! Key and modifier translation
//!
//! Native key codes from either backend are mapped into one [`Keycode`]
//! space; unmapped codes pass through as their raw value. Modifiers are
//! reported as a left/right [`Modifiers`] bitmask assembled by a
//! [`ModifierTracker`], because the native layers only report a merged bit
//! per modifier family.

mod keycode;
mod modifiers;
mod x11_keys;

pub use keycode::{translate_glfw_key, Keycode, MouseButton};
pub use modifiers::{ModifierTracker, Modifiers, NativeModifiers};
pub use x11_keys::translate_x11_keysym;
