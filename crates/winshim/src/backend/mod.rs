//! Backend implementations
//!
//! Platform abstraction over the native windowing layer. A backend owns the
//! native half of every window and decides how native input reaches the
//! application: the GLFW backend queues notifications through a
//! [`CallbackChannel`](crate::channel::CallbackChannel), the X11 backend
//! translates one event per poll through a
//! [`PollChannel`](crate::channel::PollChannel).
//!
//! The backend is chosen at build time: [`DefaultBackend`] is the X11
//! backend when the `x11` feature is enabled, otherwise the GLFW backend
//! when `glfw` is enabled, otherwise the [`MockBackend`].

#[cfg(feature = "glfw")]
pub mod glfw;
pub mod mock;
#[cfg(feature = "x11")]
pub mod x11;

use std::fmt;

pub use mock::{MockBackend, MockContext, MockOp, MockWindow};

use crate::{
    config::ShimConfig,
    context::Context,
    error::ShimError,
    event::Event,
    window::{Geometry, Placement, WindowFlags},
};

/// Backend selected by the enabled cargo features
#[cfg(feature = "x11")]
pub type DefaultBackend = x11::X11Backend;

/// Backend selected by the enabled cargo features
#[cfg(all(feature = "glfw", not(feature = "x11")))]
pub type DefaultBackend = glfw::GlfwBackend;

/// Backend selected by the enabled cargo features
#[cfg(not(any(feature = "glfw", feature = "x11")))]
pub type DefaultBackend = MockBackend;

/// Native windowing layer
///
/// All methods are called from the thread that owns the [`crate::Shim`].
/// Window state bookkeeping (geometry, snapshot, latches) is done by the
/// shim and the channels; a backend only talks to the native layer.
pub trait Backend {
    /// Native half of a window
    type Window;
    /// Native rendering context handle
    type GlContext: Copy + fmt::Debug;

    /// Human readable name
    const NAME: &'static str;
    /// Two digit backend id used in the version string
    const ID: &'static str;
    /// Backend version
    const VERSION: &'static str;

    /// Bring up the native layer
    fn init(&mut self, config: &ShimConfig) -> Result<(), ShimError>;

    /// Release undelivered events before teardown
    fn release_events(&mut self, _ctx: &mut Context<Self::Window>) {}

    /// Shut the native layer down; every window is already destroyed
    fn terminate(&mut self);

    /// Geometry of the primary display
    fn primary_display(&mut self) -> Result<Geometry, ShimError>;

    /// Create a native window and its rendering context
    ///
    /// On failure every native resource created by this call is released.
    fn create_window(
        &mut self,
        title: &str,
        flags: WindowFlags,
        placement: &Placement,
        config: &ShimConfig,
    ) -> Result<Self::Window, ShimError>;

    /// Release the rendering context, then the native window
    fn destroy_window(&mut self, window: Self::Window);

    /// Ask the native layer to close the window
    fn request_close(&mut self, window: &mut Self::Window);

    /// Switch the window into (`entering`) or out of fullscreen at `target`
    fn set_fullscreen(&mut self, window: &mut Self::Window, entering: bool, target: Geometry)
        -> Result<(), ShimError>;

    /// Dispatch notifications the native layer has raised so far
    ///
    /// Called while a fullscreen transition is in progress so the window
    /// state sees the transition's own notifications with the transition
    /// flag set.
    fn dispatch_pending(&mut self, _ctx: &mut Context<Self::Window>) {}

    /// Make the window's context current on this thread
    fn make_current(&mut self, window: &mut Self::Window) -> Result<Self::GlContext, ShimError>;

    /// Present the back buffer
    fn swap_buffers(&mut self, window: &mut Self::Window) -> Result<(), ShimError>;

    /// Deliver at most one event into `out` without blocking
    fn poll_event(&mut self, ctx: &mut Context<Self::Window>, out: &mut Event) -> bool;
}
