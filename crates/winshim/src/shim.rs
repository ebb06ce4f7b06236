//! The application-facing facade

use bitflags::bitflags;
use slotmap::Key;

use crate::{
    alloc::Allocator,
    backend::{Backend, DefaultBackend},
    config::ShimConfig,
    context::Context,
    error::{ErrorTrace, ShimError},
    event::Event,
    window::{Geometry, Placement, WindowFlags, WindowHandle, WindowRecord, WindowState},
};

/// Version of the shim core
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

bitflags! {
    /// Subsystems to bring up in [`Shim::init`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u32 {
        /// Windowing and input
        const VIDEO = 0x0001;
    }
}

/// Window and input context
///
/// Owns the backend and every window. Failures are recorded in the error
/// trace returned by [`error`](Self::error) and reported to the caller as
/// `None` or `false`; only [`init`](Self::init) returns a `Result`.
///
/// Only one window is active at a time: creating a window makes it the
/// active one, and only the active window produces events.
pub struct Shim<B: Backend = DefaultBackend> {
    backend: B,
    ctx: Context<B::Window>,
}

impl Shim<DefaultBackend> {
    /// Create a context on the build's default backend
    pub fn new() -> Self {
        Self::with_config(ShimConfig::default())
    }

    /// Create a context on the default backend with `config`
    pub fn with_config(config: ShimConfig) -> Self {
        Self::with_backend(DefaultBackend::default(), config)
    }
}

impl Default for Shim<DefaultBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Shim<B> {
    /// Create a context on `backend`
    pub fn with_backend(backend: B, config: ShimConfig) -> Self {
        Self {
            backend,
            ctx: Context::new(config),
        }
    }

    /// Replace the allocator used for queued events and dropped paths
    pub fn set_allocator(&mut self, allocator: Box<dyn Allocator>) {
        self.ctx.allocator = allocator;
    }

    /// Bring up the requested subsystems
    ///
    /// Initializing twice, or asking for anything but [`InitFlags::VIDEO`],
    /// is an init error.
    pub fn init(&mut self, flags: InitFlags) -> Result<(), ShimError> {
        let result = self.try_init(flags);
        if let Err(e) = &result {
            self.ctx.fail(e);
        }
        result
    }

    fn try_init(&mut self, flags: InitFlags) -> Result<(), ShimError> {
        if self.ctx.is_initialized() {
            return Err(ShimError::Init("Already initialized".to_string()));
        }
        if flags != InitFlags::VIDEO {
            return Err(ShimError::Init(format!("Unsupported subsystem flags {:#06x}", flags.bits())));
        }

        self.backend.init(&self.ctx.config)?;
        self.ctx.modifiers.reset();
        self.ctx.set_initialized(true);
        log::info!("Initialized {} backend ({})", B::NAME, self.version());
        Ok(())
    }

    /// Tear everything down
    ///
    /// Undelivered events are released, every window is destroyed and the
    /// native layer is shut down. The context can be initialized again.
    pub fn quit(&mut self) {
        if !self.ctx.is_initialized() {
            log::debug!("quit called while not initialized");
            return;
        }

        self.backend.release_events(&mut self.ctx);
        for record in self.ctx.drain_windows() {
            self.backend.destroy_window(record.native);
        }
        self.backend.terminate();
        self.ctx.modifiers.reset();
        self.ctx.set_initialized(false);
        log::info!("Shut down {} backend", B::NAME);
    }

    /// Deliver at most one pending event into `out`
    ///
    /// Never blocks. Returns `false` when nothing is pending. The drop paths
    /// of the event previously stored in `out` are released.
    pub fn poll_event(&mut self, out: &mut Event) -> bool {
        if !self.ctx.is_initialized() {
            self.ctx.fail(&ShimError::not_initialized());
            return false;
        }
        self.backend.poll_event(&mut self.ctx, out)
    }

    /// Accumulated error trace
    pub fn error(&self) -> &str {
        self.ctx.errors.as_str()
    }

    /// The error trace itself
    pub const fn errors(&self) -> &ErrorTrace {
        &self.ctx.errors
    }

    /// `"<core>+<backend id>_<backend version>"`
    pub fn version(&self) -> String {
        format!("{CORE_VERSION}+{}_{}", B::ID, B::VERSION)
    }

    /// Create a window and make it the active one
    ///
    /// Placement precedence is fullscreen, maximized, centered, then the
    /// explicit `x`/`y`. Returns `None` on failure.
    pub fn create_window(
        &mut self,
        title: &str,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        flags: WindowFlags,
    ) -> Option<WindowHandle> {
        let result = self.try_create_window(title, Geometry::new(x, y, w, h), flags);
        self.record(result)
    }

    fn try_create_window(
        &mut self,
        title: &str,
        requested: Geometry,
        flags: WindowFlags,
    ) -> Result<WindowHandle, ShimError> {
        self.require_init()?;
        if !requested.has_area() {
            return Err(ShimError::Window(format!(
                "Invalid window size {}x{}",
                requested.w, requested.h
            )));
        }

        let display = if flags.needs_display() {
            Some(self.backend.primary_display()?)
        } else {
            None
        };
        let placement = Placement::resolve(flags, requested, display);
        let native = self.backend.create_window(title, flags, &placement, &self.ctx.config)?;

        let state = WindowState::new(title, flags, requested, placement);
        log::debug!("Created window \"{title}\" at {:?}", state.geometry());
        Ok(self.ctx.insert_window(WindowRecord::new(state, native)))
    }

    /// Request that `window` closes
    ///
    /// The window is not destroyed; a quit event is delivered once the
    /// request reaches the event stream.
    pub fn close_window(&mut self, window: WindowHandle) {
        let result = self.try_close_window(window);
        self.record(result);
    }

    fn try_close_window(&mut self, window: WindowHandle) -> Result<(), ShimError> {
        self.require_init()?;
        let record = self
            .ctx
            .record_mut(window)
            .ok_or_else(|| ShimError::invalid_window("close"))?;
        record.state.request_close();
        self.backend.request_close(&mut record.native);
        Ok(())
    }

    /// Destroy `window`, releasing its context and native window
    pub fn destroy_window(&mut self, window: WindowHandle) {
        let result = self.try_destroy_window(window);
        self.record(result);
    }

    fn try_destroy_window(&mut self, window: WindowHandle) -> Result<(), ShimError> {
        self.require_init()?;
        let record = self
            .ctx
            .remove_window(window)
            .ok_or_else(|| ShimError::invalid_window("destroy"))?;
        log::debug!("Destroying window \"{}\"", record.state.title());
        self.backend.destroy_window(record.native);
        Ok(())
    }

    /// Switch `window` into or out of fullscreen
    ///
    /// Entering remembers the windowed geometry; leaving restores it.
    /// Notifications raised by the switch itself are dispatched before this
    /// returns and do not disturb the remembered geometry.
    pub fn toggle_fullscreen(&mut self, window: WindowHandle) {
        let result = self.try_toggle_fullscreen(window);
        self.record(result);
    }

    fn try_toggle_fullscreen(&mut self, window: WindowHandle) -> Result<(), ShimError> {
        self.require_init()?;
        let entering = !self
            .ctx
            .record(window)
            .ok_or_else(|| ShimError::invalid_window("toggle fullscreen on"))?
            .state
            .is_fullscreen();
        let display = if entering {
            Some(self.backend.primary_display()?)
        } else {
            None
        };

        let record = self
            .ctx
            .record_mut(window)
            .ok_or_else(|| ShimError::invalid_window("toggle fullscreen on"))?;
        let saved = record.state.clone();
        let target = match display {
            Some(display) => record.state.enter_fullscreen(display),
            None => record.state.exit_fullscreen(),
        };
        if let Err(e) = self.backend.set_fullscreen(&mut record.native, entering, target) {
            record.state = saved;
            return Err(e);
        }

        self.backend.dispatch_pending(&mut self.ctx);
        if let Some(record) = self.ctx.record_mut(window) {
            record.state.finish_transition();
        }
        log::debug!("{} fullscreen, target {target:?}", if entering { "Entered" } else { "Left" });
        Ok(())
    }

    /// Make `window`'s context current and return its native handle
    pub fn gl_context(&mut self, window: WindowHandle) -> Option<B::GlContext> {
        let result = self.try_gl_context(window);
        self.record(result)
    }

    fn try_gl_context(&mut self, window: WindowHandle) -> Result<B::GlContext, ShimError> {
        self.require_init()?;
        let record = self
            .ctx
            .record_mut(window)
            .ok_or_else(|| ShimError::invalid_window("get context of"))?;
        self.backend.make_current(&mut record.native)
    }

    /// Present `window`'s back buffer
    pub fn swap_window(&mut self, window: WindowHandle) {
        let result = self.try_swap_window(window);
        self.record(result);
    }

    fn try_swap_window(&mut self, window: WindowHandle) -> Result<(), ShimError> {
        self.require_init()?;
        let record = self
            .ctx
            .record_mut(window)
            .ok_or_else(|| ShimError::invalid_window("swap"))?;
        self.backend.make_current(&mut record.native)?;
        self.backend.swap_buffers(&mut record.native)
    }

    /// The window that currently receives events
    pub fn active_window(&self) -> Option<WindowHandle> {
        let active = self.ctx.active();
        (!active.is_null()).then_some(active)
    }

    /// State of `window`
    pub fn window(&self, window: WindowHandle) -> Option<&WindowState> {
        self.ctx.record(window).map(|record| &record.state)
    }

    /// Whether `init` has succeeded and `quit` has not run since
    pub const fn is_initialized(&self) -> bool {
        self.ctx.is_initialized()
    }

    /// Active configuration
    pub const fn config(&self) -> &ShimConfig {
        &self.ctx.config
    }

    /// The backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn require_init(&self) -> Result<(), ShimError> {
        if self.ctx.is_initialized() {
            Ok(())
        } else {
            Err(ShimError::not_initialized())
        }
    }

    fn record<T>(&mut self, result: Result<T, ShimError>) -> Option<T> {
        result.map_err(|e| self.ctx.fail(&e)).ok()
    }
}

impl<B: Backend> Drop for Shim<B> {
    fn drop(&mut self) {
        if self.ctx.is_initialized() {
            self.quit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{MockBackend, MockContext, MockOp},
        channel::Notification,
        error::ErrorKind,
        event::EventType,
    };

    fn shim() -> Shim<MockBackend> {
        let mut shim = Shim::with_backend(MockBackend::new(), ShimConfig::default());
        shim.init(InitFlags::VIDEO).unwrap();
        shim
    }

    #[test]
    fn test_version_string() {
        let shim = Shim::with_backend(MockBackend::new(), ShimConfig::default());
        assert_eq!(shim.version(), format!("{CORE_VERSION}+00_0.1.0"));
    }

    #[test]
    fn test_double_init() {
        let mut shim = shim();
        assert!(matches!(shim.init(InitFlags::VIDEO), Err(ShimError::Init(_))));
        assert_eq!(shim.errors().count(ErrorKind::Init), 1);
    }

    #[test]
    fn test_unknown_subsystem() {
        let mut shim = Shim::with_backend(MockBackend::new(), ShimConfig::default());
        assert!(shim.init(InitFlags::from_bits_retain(0x0020)).is_err());
        assert!(shim.init(InitFlags::empty()).is_err());
        assert!(!shim.is_initialized());
    }

    #[test]
    fn test_poll_before_init() {
        let mut shim = Shim::with_backend(MockBackend::new(), ShimConfig::default());
        let mut event = Event::None;
        assert!(!shim.poll_event(&mut event));
        assert_eq!(shim.errors().count(ErrorKind::Init), 1);
    }

    #[test]
    fn test_invalid_size() {
        let mut shim = shim();
        assert!(shim.create_window("T", 0, 0, 0, 200, WindowFlags::SHOWN).is_none());
        assert_eq!(shim.errors().count(ErrorKind::Window), 1);
    }

    #[test]
    fn test_native_failure() {
        let mut shim = shim();
        shim.backend_mut().fail_next_window();
        assert!(shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).is_none());
        assert!(shim.active_window().is_none());
        assert_eq!(shim.errors().count(ErrorKind::Window), 1);
    }

    #[test]
    fn test_context_and_swap() {
        let mut shim = shim();
        let window = shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();

        assert_eq!(shim.gl_context(window), Some(MockContext(0xCAFE_FEED)));
        shim.swap_window(window);

        let ops = shim.backend().ops();
        assert!(ops.ends_with(&[MockOp::MakeCurrent(1), MockOp::MakeCurrent(1), MockOp::SwapBuffers(1)]));
    }

    #[test]
    fn test_destroy_releases_context_first() {
        let mut shim = shim();
        let window = shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();
        shim.destroy_window(window);

        assert!(shim.active_window().is_none());
        assert!(shim.backend().ops().ends_with(&[MockOp::ReleaseContext(1), MockOp::DestroyWindow(1)]));
    }

    #[test]
    fn test_stale_handle() {
        let mut shim = shim();
        let window = shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();
        shim.destroy_window(window);
        shim.destroy_window(window);
        shim.toggle_fullscreen(window);

        assert_eq!(shim.errors().count(ErrorKind::Window), 2);
    }

    #[test]
    fn test_close_request_is_one_quit() {
        let mut shim = shim();
        let window = shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();
        shim.close_window(window);
        shim.close_window(window);

        let mut event = Event::None;
        assert!(shim.poll_event(&mut event));
        assert_eq!(event.event_type(), EventType::Quit);
        assert!(!shim.poll_event(&mut event));
        assert!(shim.window(window).is_some());
    }

    #[test]
    fn test_quit_releases_everything() {
        let mut shim = shim();
        shim.create_window("T", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();
        shim.backend_mut().push_notification(Notification::Refresh);
        let mut event = Event::None;
        shim.poll_event(&mut event);
        shim.backend_mut().push_notification(Notification::Refresh);
        shim.backend_mut().push_notification(Notification::Dropped(vec!["/tmp/pending.txt".to_string()]));
        shim.poll_event(&mut event);
        assert_eq!(shim.backend().queued(), 1);

        shim.quit();
        assert_eq!(shim.backend().queued(), 0);
        assert!(!shim.is_initialized());
        assert!(shim.active_window().is_none());
        assert_eq!(shim.backend().ops().last(), Some(&MockOp::Terminate));

        // a fresh init starts clean
        shim.init(InitFlags::VIDEO).unwrap();
        assert!(!shim.poll_event(&mut event));
    }

    #[test]
    fn test_toggle_without_echo() {
        let mut shim = shim();
        let window = shim.create_window("T", 50, 60, 300, 200, WindowFlags::SHOWN).unwrap();

        shim.toggle_fullscreen(window);
        let state = shim.window(window).unwrap();
        assert!(state.is_fullscreen());
        assert!(!state.is_transitioning());
        assert_eq!(state.geometry(), Geometry::new(0, 0, 1920, 1080));

        shim.toggle_fullscreen(window);
        let state = shim.window(window).unwrap();
        assert!(!state.is_fullscreen());
        assert_eq!(state.geometry(), Geometry::new(50, 60, 300, 200));
    }

    #[test]
    fn test_toggle_inactive_window_leaves_active_alone() {
        let mut shim = Shim::with_backend(MockBackend::new().echo_transitions(true), ShimConfig::default());
        shim.init(InitFlags::VIDEO).unwrap();
        let background = shim.create_window("A", 10, 10, 300, 200, WindowFlags::SHOWN).unwrap();
        let active = shim.create_window("B", 400, 300, 640, 480, WindowFlags::SHOWN).unwrap();

        shim.toggle_fullscreen(background);
        assert!(shim.window(background).unwrap().is_fullscreen());
        assert_eq!(shim.window(active).unwrap().geometry(), Geometry::new(400, 300, 640, 480));
        assert_eq!(shim.active_window(), Some(active));

        shim.toggle_fullscreen(background);
        assert_eq!(shim.window(background).unwrap().geometry(), Geometry::new(10, 10, 300, 200));
        assert_eq!(shim.window(active).unwrap().geometry(), Geometry::new(400, 300, 640, 480));
    }
}
