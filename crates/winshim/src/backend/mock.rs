//! Scriptable in-process backend
//!
//! Behaves like a callback-driven native layer without touching one:
//! notifications are scripted with [`MockBackend::push_notification`] and
//! dispatched on the next poll, and every native call is recorded in an
//! operation log tests can inspect.

use std::collections::VecDeque;

use slotmap::Key;

use super::Backend;
use crate::{
    channel::{CallbackChannel, Notification},
    config::ShimConfig,
    context::Context,
    error::ShimError,
    event::Event,
    window::{Geometry, Placement, WindowFlags, WindowHandle},
};

/// Context handle reported by the mock backend
pub const MOCK_CONTEXT: u32 = 0xCAFE_FEED;

/// Fake rendering context handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockContext(pub u32);

/// Native half of a mock window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    /// Sequential window id
    pub id: u32,
    /// Rendering context
    pub context: MockContext,
    /// Geometry last applied by the backend
    pub geometry: Geometry,
    /// Whether the window covers the display
    pub fullscreen: bool,
    /// Native should-close flag
    pub should_close: bool,
}

/// Native call recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    /// Native layer brought up
    Init,
    /// Native layer shut down
    Terminate,
    /// Window created
    CreateWindow(u32),
    /// Rendering context released
    ReleaseContext(u32),
    /// Window released
    DestroyWindow(u32),
    /// Native close requested
    RequestClose(u32),
    /// Fullscreen switched on or off
    SetFullscreen(u32, bool),
    /// Context made current
    MakeCurrent(u32),
    /// Buffers swapped
    SwapBuffers(u32),
}

/// Callback-driven test double
#[derive(Debug)]
pub struct MockBackend {
    display: Geometry,
    channel: CallbackChannel,
    /// Scripted notifications, with the id of the window a transition echo is for
    pending: VecDeque<(Option<u32>, Notification)>,
    ops: Vec<MockOp>,
    next_id: u32,
    echo_transitions: bool,
    fail_next_window: bool,
}

impl MockBackend {
    /// Mock with a 1920x1080 primary display
    pub fn new() -> Self {
        Self::with_display(Geometry::new(0, 0, 1920, 1080))
    }

    /// Mock with the given primary display
    pub fn with_display(display: Geometry) -> Self {
        Self {
            display,
            channel: CallbackChannel::default(),
            pending: VecDeque::new(),
            ops: Vec::new(),
            next_id: 1,
            echo_transitions: false,
            fail_next_window: false,
        }
    }

    /// Raise resize and move notifications from fullscreen transitions,
    /// the way a real window manager does
    #[must_use]
    pub const fn echo_transitions(mut self, echo: bool) -> Self {
        self.echo_transitions = echo;
        self
    }

    /// Make the next `create_window` fail
    pub fn fail_next_window(&mut self) {
        self.fail_next_window = true;
    }

    /// Script a notification for the active window
    pub fn push_notification(&mut self, notification: Notification) {
        self.pending.push_back((None, notification));
    }

    /// Native calls made so far
    pub fn ops(&self) -> &[MockOp] {
        &self.ops
    }

    /// Events translated but not yet polled
    pub fn queued(&self) -> usize {
        self.channel.pending()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    type Window = MockWindow;
    type GlContext = MockContext;

    const NAME: &'static str = "mock";
    const ID: &'static str = "00";
    const VERSION: &'static str = "0.1.0";

    fn init(&mut self, config: &ShimConfig) -> Result<(), ShimError> {
        self.channel = CallbackChannel::with_capacity(config.event_queue_capacity);
        self.pending.clear();
        self.ops.push(MockOp::Init);
        Ok(())
    }

    fn release_events(&mut self, _ctx: &mut Context<MockWindow>) {
        self.pending.clear();
        self.channel.release();
    }

    fn terminate(&mut self) {
        self.ops.push(MockOp::Terminate);
    }

    fn primary_display(&mut self) -> Result<Geometry, ShimError> {
        Ok(self.display)
    }

    fn create_window(
        &mut self,
        title: &str,
        _flags: WindowFlags,
        placement: &Placement,
        _config: &ShimConfig,
    ) -> Result<MockWindow, ShimError> {
        if std::mem::take(&mut self.fail_next_window) {
            return Err(ShimError::Window(format!("Failed to create window \"{title}\"")));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.ops.push(MockOp::CreateWindow(id));
        Ok(MockWindow {
            id,
            context: MockContext(MOCK_CONTEXT),
            geometry: placement.geometry(),
            fullscreen: matches!(placement, Placement::Fullscreen(_)),
            should_close: false,
        })
    }

    fn destroy_window(&mut self, window: MockWindow) {
        self.ops.push(MockOp::ReleaseContext(window.id));
        self.ops.push(MockOp::DestroyWindow(window.id));
    }

    fn request_close(&mut self, window: &mut MockWindow) {
        window.should_close = true;
        self.ops.push(MockOp::RequestClose(window.id));
    }

    fn set_fullscreen(&mut self, window: &mut MockWindow, entering: bool, target: Geometry) -> Result<(), ShimError> {
        window.fullscreen = entering;
        window.geometry = target;
        self.ops.push(MockOp::SetFullscreen(window.id, entering));

        if self.echo_transitions {
            let id = Some(window.id);
            self.pending.push_back((id, Notification::Resized { w: target.w, h: target.h }));
            self.pending.push_back((id, Notification::Moved { x: target.x, y: target.y }));
        }
        Ok(())
    }

    fn dispatch_pending(&mut self, ctx: &mut Context<MockWindow>) {
        while let Some((target, notification)) = self.pending.pop_front() {
            let window = match target {
                Some(id) => ctx
                    .windows_mut()
                    .find(|(_, record)| record.native.id == id)
                    .map_or_else(WindowHandle::null, |(handle, _)| handle),
                None => ctx.active(),
            };
            self.channel.dispatch(ctx, window, notification);
        }
    }

    fn make_current(&mut self, window: &mut MockWindow) -> Result<MockContext, ShimError> {
        self.ops.push(MockOp::MakeCurrent(window.id));
        Ok(window.context)
    }

    fn swap_buffers(&mut self, window: &mut MockWindow) -> Result<(), ShimError> {
        self.ops.push(MockOp::SwapBuffers(window.id));
        Ok(())
    }

    fn poll_event(&mut self, ctx: &mut Context<MockWindow>, out: &mut Event) -> bool {
        self.dispatch_pending(ctx);
        self.channel.poll(ctx, out)
    }
}
