//! Shim-wide state shared by the facade and the backends
//!
//! Everything a native notification may need to touch (window records,
//! modifier tracking, the allocator and the error trace) lives here so the
//! backends can be handed one `&mut Context` while they dispatch.

use slotmap::{Key, SlotMap};

use crate::{
    alloc::{Allocator, SystemAllocator},
    config::ShimConfig,
    error::{ErrorTrace, ShimError},
    input::ModifierTracker,
    window::{WindowHandle, WindowRecord, WindowState},
};

/// Shared shim state, generic over the backend's native window type
pub struct Context<N> {
    /// Active configuration
    pub config: ShimConfig,
    /// Accumulated error trace
    pub errors: ErrorTrace,
    /// Allocator for queued events and dropped paths
    pub allocator: Box<dyn Allocator>,
    /// Left/right modifier state
    pub modifiers: ModifierTracker,
    windows: SlotMap<WindowHandle, WindowRecord<N>>,
    active: WindowHandle,
    initialized: bool,
}

impl<N> Context<N> {
    /// Create an uninitialized context
    pub fn new(config: ShimConfig) -> Self {
        let errors = ErrorTrace::with_capacity(config.error_trace_capacity);
        Self {
            config,
            errors,
            allocator: Box::new(SystemAllocator),
            modifiers: ModifierTracker::new(),
            windows: SlotMap::with_key(),
            active: WindowHandle::null(),
            initialized: false,
        }
    }

    /// Record `err` in the trace
    pub fn fail(&mut self, err: &ShimError) {
        self.errors.record(err);
    }

    /// Whether `init` has succeeded and `quit` has not run since
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Store a new window and make it the active one
    pub fn insert_window(&mut self, record: WindowRecord<N>) -> WindowHandle {
        let handle = self.windows.insert(record);
        if !self.active.is_null() {
            log::warn!("Replacing the active window; only one window receives events");
        }
        self.active = handle;
        handle
    }

    /// Remove a window, clearing the active handle if it pointed there
    pub fn remove_window(&mut self, handle: WindowHandle) -> Option<WindowRecord<N>> {
        let record = self.windows.remove(handle)?;
        if self.active == handle {
            self.active = WindowHandle::null();
        }
        Some(record)
    }

    /// Remove every window
    pub fn drain_windows(&mut self) -> Vec<WindowRecord<N>> {
        self.active = WindowHandle::null();
        self.windows.drain().map(|(_, record)| record).collect()
    }

    /// Handle of the active window (null when there is none)
    pub const fn active(&self) -> WindowHandle {
        self.active
    }

    /// Record of `handle`
    pub fn record(&self, handle: WindowHandle) -> Option<&WindowRecord<N>> {
        self.windows.get(handle)
    }

    /// Mutable record of `handle`
    pub fn record_mut(&mut self, handle: WindowHandle) -> Option<&mut WindowRecord<N>> {
        self.windows.get_mut(handle)
    }

    /// Mutable record of the active window
    pub fn active_record_mut(&mut self) -> Option<&mut WindowRecord<N>> {
        self.windows.get_mut(self.active)
    }

    /// Mutable state of the active window
    pub fn active_state_mut(&mut self) -> Option<&mut WindowState> {
        self.active_record_mut().map(|record| &mut record.state)
    }

    /// Every live window with its handle
    pub fn windows_mut(&mut self) -> impl Iterator<Item = (WindowHandle, &mut WindowRecord<N>)> {
        self.windows.iter_mut()
    }
}
