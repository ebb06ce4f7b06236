//! Window handles and records

use super::WindowState;

slotmap::new_key_type! {
    /// Handle to a window owned by a [`crate::Shim`]
    ///
    /// `WindowHandle::default()` is the null handle. Handles of destroyed
    /// windows go stale and are rejected like the null handle.
    pub struct WindowHandle;
}

/// A window: shared state plus the backend's native half
#[derive(Debug)]
pub struct WindowRecord<N> {
    /// Backend independent state
    pub state: WindowState,
    /// Native display, window and context handles
    pub native: N,
}

impl<N> WindowRecord<N> {
    /// Pair `state` with its native window
    pub const fn new(state: WindowState, native: N) -> Self {
        Self { state, native }
    }
}
