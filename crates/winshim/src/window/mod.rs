//! Window state machine
//!
//! [`WindowState`] is the backend independent half of a window: geometry,
//! the restore snapshot used to leave fullscreen, the transition flag and
//! the close latch, plus the observable shown/minimized/maximized/focused
//! attributes. Backends own the native half and feed notifications in.
//!
//! # Restore snapshot
//!
//! While the window is windowed and no fullscreen transition is running, the
//! snapshot follows every geometry notification. While fullscreen, or while
//! a transition is dispatching its own notifications, the snapshot is frozen
//! so that leaving fullscreen returns to the last windowed geometry.

mod handle;

pub use handle::{WindowHandle, WindowRecord};

use bitflags::bitflags;

bitflags! {
    /// Window creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        /// Map the window immediately
        const SHOWN = 1 << 0;
        /// Allow the user to resize the window
        const RESIZABLE = 1 << 2;
        /// Cover the primary display
        const FULLSCREEN = 1 << 3;
        /// Center on the primary display
        const CENTERED = 1 << 4;
        /// Ask the window manager to maximize
        const MAXIMIZED = 1 << 5;
    }
}

impl WindowFlags {
    /// Whether placement needs the primary display geometry
    pub const fn needs_display(self) -> bool {
        self.intersects(Self::FULLSCREEN.union(Self::CENTERED))
    }
}

/// Position and size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Geometry {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Geometry {
    /// Create a geometry
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether both dimensions are positive
    pub const fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    const fn same_size(&self, other: &Self) -> bool {
        self.w == other.w && self.h == other.h
    }

    const fn same_position(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Where a new window goes, resolved from its flags
///
/// Exactly one placement applies; precedence is fullscreen, then maximized,
/// then centered, then the explicit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Cover the display
    Fullscreen(Geometry),
    /// Create at the requested geometry, then maximize
    Maximized(Geometry),
    /// Requested size centered on the display
    Centered(Geometry),
    /// Requested geometry as given
    Explicit(Geometry),
}

impl Placement {
    /// Resolve the placement for `flags`
    ///
    /// `display` is the primary display geometry; when it is missing,
    /// display-relative placements fall back to the requested geometry.
    pub fn resolve(flags: WindowFlags, requested: Geometry, display: Option<Geometry>) -> Self {
        match display {
            Some(display) if flags.contains(WindowFlags::FULLSCREEN) => Self::Fullscreen(display),
            _ if flags.contains(WindowFlags::MAXIMIZED) => Self::Maximized(requested),
            Some(display) if flags.contains(WindowFlags::CENTERED) => Self::Centered(Geometry {
                x: display.x + (display.w - requested.w) / 2,
                y: display.y + (display.h - requested.h) / 2,
                ..requested
            }),
            _ => {
                if flags.needs_display() {
                    log::warn!("No display geometry available, using requested placement");
                }
                Self::Explicit(requested)
            }
        }
    }

    /// Geometry the window is created with
    pub const fn geometry(&self) -> Geometry {
        match *self {
            Self::Fullscreen(g) | Self::Maximized(g) | Self::Centered(g) | Self::Explicit(g) => g,
        }
    }
}

/// Outcome of a configure notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureChange {
    /// The size changed (the position may have changed too)
    Resized,
    /// Only the position changed
    Moved,
    /// Nothing changed
    Unchanged,
}

/// Backend independent window state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    title: String,
    flags: WindowFlags,
    geometry: Geometry,
    restore: Geometry,
    fullscreen: bool,
    in_transition: bool,
    close_requested: bool,
    shown: bool,
    minimized: bool,
    maximized: bool,
    focused: bool,
}

impl WindowState {
    /// State of a window just created with `placement`
    ///
    /// A fullscreen window remembers the requested geometry so that leaving
    /// fullscreen has somewhere to go.
    pub fn new(title: impl Into<String>, flags: WindowFlags, requested: Geometry, placement: Placement) -> Self {
        let geometry = placement.geometry();
        let (restore, fullscreen) = match placement {
            Placement::Fullscreen(_) => (requested, true),
            _ => (geometry, false),
        };

        Self {
            title: title.into(),
            flags,
            geometry,
            restore,
            fullscreen,
            in_transition: false,
            close_requested: false,
            shown: flags.contains(WindowFlags::SHOWN),
            minimized: false,
            maximized: matches!(placement, Placement::Maximized(_)),
            focused: false,
        }
    }

    /// Window title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Creation flags
    pub const fn flags(&self) -> WindowFlags {
        self.flags
    }

    /// Current geometry
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Geometry restored when leaving fullscreen
    pub const fn restore(&self) -> Geometry {
        self.restore
    }

    /// Whether the window covers the display
    pub const fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Whether a fullscreen transition is being dispatched
    pub const fn is_transitioning(&self) -> bool {
        self.in_transition
    }

    /// Whether the window is mapped
    pub const fn is_shown(&self) -> bool {
        self.shown
    }

    /// Whether the window is iconified
    pub const fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Whether the window is maximized
    pub const fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Whether the window has input focus
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether a close request is pending
    pub const fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Whether notifications may move the restore snapshot
    pub const fn tracks_restore(&self) -> bool {
        !self.fullscreen && !self.in_transition
    }

    fn sync_restore(&mut self) {
        if self.tracks_restore() {
            self.restore = self.geometry;
        }
    }

    /// Size notification
    pub fn on_resize(&mut self, w: i32, h: i32) {
        self.geometry.w = w;
        self.geometry.h = h;
        self.sync_restore();
    }

    /// Position notification
    pub fn on_move(&mut self, x: i32, y: i32) {
        self.geometry.x = x;
        self.geometry.y = y;
        self.sync_restore();
    }

    /// Combined position and size notification
    pub fn on_configure(&mut self, geometry: Geometry) -> ConfigureChange {
        let change = if !self.geometry.same_size(&geometry) {
            ConfigureChange::Resized
        } else if !self.geometry.same_position(&geometry) {
            ConfigureChange::Moved
        } else {
            ConfigureChange::Unchanged
        };
        self.geometry = geometry;
        self.sync_restore();
        change
    }

    /// Iconify notification
    pub fn on_minimize(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    /// Maximize notification
    pub fn on_maximize(&mut self, maximized: bool) {
        self.maximized = maximized;
        if maximized {
            self.minimized = false;
        }
    }

    /// Focus notification
    pub fn on_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Map (`true`) or unmap (`false`) notification
    pub fn on_map(&mut self, mapped: bool) {
        self.shown = mapped;
        self.minimized = !mapped;
    }

    /// Start entering fullscreen on `display`
    ///
    /// Snapshots the current geometry and returns the target geometry.
    pub fn enter_fullscreen(&mut self, display: Geometry) -> Geometry {
        self.restore = self.geometry;
        self.fullscreen = true;
        self.in_transition = true;
        self.geometry = display;
        display
    }

    /// Start leaving fullscreen, returning the snapshot to restore
    pub fn exit_fullscreen(&mut self) -> Geometry {
        self.fullscreen = false;
        self.in_transition = true;
        self.geometry = self.restore;
        self.restore
    }

    /// End the running fullscreen transition
    pub fn finish_transition(&mut self) {
        self.in_transition = false;
    }

    /// Set the close latch
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Consume the close latch
    pub fn take_close_request(&mut self) -> bool {
        std::mem::take(&mut self.close_requested)
    }
}
