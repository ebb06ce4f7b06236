//! GLFW backend
//!
//! Callback driven: GLFW delivers window events into a per-window receiver
//! while it is pumped, each one is turned into a [`Notification`] and
//! translated into the [`CallbackChannel`] queue, and polls hand the queued
//! events out one at a time.
//!
//! A hidden 1x1 window is created at init; every real window shares its
//! OpenGL objects.

use glfw::{Context as _, WindowEvent, WindowHint, WindowMode};

use super::Backend;
use crate::{
    channel::{CallbackChannel, KeyAction, Notification},
    config::{GlConfig, ShimConfig},
    context::Context,
    error::ShimError,
    event::Event,
    input::NativeModifiers,
    window::{Geometry, Placement, WindowFlags},
};

type EventReceiver = glfw::GlfwReceiver<(f64, WindowEvent)>;

/// GLFW window handle used as the rendering context handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlfwContext(pub *mut glfw::ffi::GLFWwindow);

/// Native half of a GLFW window
pub struct GlfwWindow {
    window: glfw::PWindow,
    events: EventReceiver,
}

/// GLFW windowing backend
#[derive(Default)]
pub struct GlfwBackend {
    glfw: Option<glfw::Glfw>,
    shared: Option<(glfw::PWindow, EventReceiver)>,
    channel: CallbackChannel,
    swap_interval: u32,
}

impl GlfwBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self::default()
    }

    fn glfw(&mut self) -> Result<&mut glfw::Glfw, ShimError> {
        self.glfw.as_mut().ok_or_else(|| ShimError::Init("GLFW is not initialized".to_string()))
    }
}

fn apply_context_hints(glfw: &mut glfw::Glfw, gl: &GlConfig) {
    glfw.default_window_hints();
    glfw.window_hint(WindowHint::ContextVersion(gl.major_version, gl.minor_version));
    if gl.core_profile {
        glfw.window_hint(WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
    }
    glfw.window_hint(WindowHint::RedBits(Some(gl.red_bits)));
    glfw.window_hint(WindowHint::GreenBits(Some(gl.green_bits)));
    glfw.window_hint(WindowHint::BlueBits(Some(gl.blue_bits)));
    glfw.window_hint(WindowHint::AlphaBits(Some(gl.alpha_bits)));
    glfw.window_hint(WindowHint::DepthBits(Some(gl.depth_bits)));
    glfw.window_hint(WindowHint::StencilBits(Some(gl.stencil_bits)));
}

fn enable_polling(window: &mut glfw::Window) {
    window.set_key_polling(true);
    window.set_size_polling(true);
    window.set_pos_polling(true);
    window.set_iconify_polling(true);
    window.set_maximize_polling(true);
    window.set_focus_polling(true);
    window.set_refresh_polling(true);
    window.set_drag_and_drop_polling(true);
    window.set_mouse_button_polling(true);
    window.set_cursor_pos_polling(true);
    window.set_scroll_polling(true);
    window.set_close_polling(true);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn native_mods(mods: glfw::Modifiers) -> NativeModifiers {
    NativeModifiers::from_bits_truncate((mods.bits() & 0x0f) as u8)
}

const fn key_action(action: glfw::Action) -> KeyAction {
    match action {
        glfw::Action::Release => KeyAction::Release,
        glfw::Action::Press => KeyAction::Press,
        glfw::Action::Repeat => KeyAction::Repeat,
    }
}

/// Map a GLFW window event; events with no unified counterpart give `None`
fn notification(event: WindowEvent) -> Option<Notification> {
    let notification = match event {
        WindowEvent::Key(key, _, action, mods) => Notification::Key {
            key: key as i32,
            action: key_action(action),
            mods: native_mods(mods),
        },
        WindowEvent::Size(w, h) => Notification::Resized { w, h },
        WindowEvent::Pos(x, y) => Notification::Moved { x, y },
        WindowEvent::Iconify(iconified) => Notification::Iconified(iconified),
        WindowEvent::Maximize(maximized) => Notification::Maximized(maximized),
        WindowEvent::Focus(focused) => Notification::Focused(focused),
        WindowEvent::Refresh => Notification::Refresh,
        WindowEvent::FileDrop(paths) => Notification::Dropped(
            paths.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        ),
        WindowEvent::MouseButton(button, action, mods) => Notification::MouseButton {
            button: button as i32,
            pressed: action != glfw::Action::Release,
            mods: native_mods(mods),
        },
        WindowEvent::CursorPos(x, y) => Notification::CursorMoved { x, y },
        WindowEvent::Scroll(x, y) => Notification::Scrolled { x, y },
        WindowEvent::Close => Notification::CloseRequested,
        _ => return None,
    };
    Some(notification)
}

impl Backend for GlfwBackend {
    type Window = GlfwWindow;
    type GlContext = GlfwContext;

    const NAME: &'static str = "glfw";
    const ID: &'static str = "01";
    const VERSION: &'static str = "0.1.0";

    fn init(&mut self, config: &ShimConfig) -> Result<(), ShimError> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| ShimError::Init(format!("GLFW initialization failed: {e:?}")))?;

        apply_context_hints(&mut glfw, &config.gl);
        glfw.window_hint(WindowHint::Visible(false));
        let shared = glfw
            .create_window(1, 1, "", WindowMode::Windowed)
            .ok_or_else(|| ShimError::GlContext("Failed to create shared context".to_string()))?;

        log::debug!("GLFW {} with shared context", glfw::get_version_string());
        self.glfw = Some(glfw);
        self.shared = Some(shared);
        self.channel = CallbackChannel::with_capacity(config.event_queue_capacity);
        self.swap_interval = config.gl.swap_interval;
        Ok(())
    }

    fn release_events(&mut self, _ctx: &mut Context<GlfwWindow>) {
        self.channel.release();
    }

    fn terminate(&mut self) {
        glfw::make_context_current(None);
        self.shared = None;
        self.glfw = None;
    }

    #[allow(clippy::cast_possible_wrap)]
    fn primary_display(&mut self) -> Result<Geometry, ShimError> {
        self.glfw()?
            .with_primary_monitor(|_, monitor| {
                let monitor = monitor?;
                let (x, y) = monitor.get_pos();
                let mode = monitor.get_video_mode()?;
                Some(Geometry::new(x, y, mode.width as i32, mode.height as i32))
            })
            .ok_or_else(|| ShimError::GlContext("No primary monitor".to_string()))
    }

    #[allow(clippy::cast_sign_loss)]
    fn create_window(
        &mut self,
        title: &str,
        flags: WindowFlags,
        placement: &Placement,
        config: &ShimConfig,
    ) -> Result<GlfwWindow, ShimError> {
        let swap_interval = self.swap_interval;
        let Self { glfw, shared, .. } = self;
        let glfw = glfw.as_mut().ok_or_else(|| ShimError::Init("GLFW is not initialized".to_string()))?;
        let (shared, _) = shared
            .as_ref()
            .ok_or_else(|| ShimError::GlContext("Shared context missing".to_string()))?;

        apply_context_hints(glfw, &config.gl);
        glfw.window_hint(WindowHint::Visible(false));
        glfw.window_hint(WindowHint::Resizable(flags.contains(WindowFlags::RESIZABLE)));

        let geometry = placement.geometry();
        let (w, h) = (geometry.w as u32, geometry.h as u32);
        let created = match placement {
            Placement::Fullscreen(_) => glfw.with_primary_monitor(|_, monitor| {
                monitor.map(|m| shared.create_shared(w, h, title, WindowMode::FullScreen(m)))
            }),
            _ => Some(shared.create_shared(w, h, title, WindowMode::Windowed)),
        };
        let (mut window, events) = created
            .flatten()
            .ok_or_else(|| ShimError::Window(format!("Failed to create window \"{title}\"")))?;

        enable_polling(&mut window);
        match placement {
            Placement::Fullscreen(_) => {}
            Placement::Maximized(_) => window.maximize(),
            Placement::Centered(g) | Placement::Explicit(g) => window.set_pos(g.x, g.y),
        }
        if flags.contains(WindowFlags::SHOWN) {
            window.show();
        }

        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::Sync(swap_interval));
        Ok(GlfwWindow { window, events })
    }

    fn destroy_window(&mut self, window: GlfwWindow) {
        if window.window.is_current() {
            glfw::make_context_current(None);
        }
        drop(window);
    }

    fn request_close(&mut self, window: &mut GlfwWindow) {
        window.window.set_should_close(true);
    }

    #[allow(clippy::cast_sign_loss)]
    fn set_fullscreen(&mut self, window: &mut GlfwWindow, entering: bool, target: Geometry) -> Result<(), ShimError> {
        let (w, h) = (target.w as u32, target.h as u32);
        if !entering {
            window
                .window
                .set_monitor(WindowMode::Windowed, target.x, target.y, w, h, None);
            return Ok(());
        }

        self.glfw()?.with_primary_monitor(|_, monitor| {
            let monitor = monitor.ok_or_else(|| ShimError::GlContext("No primary monitor".to_string()))?;
            let refresh = monitor.get_video_mode().map(|mode| mode.refresh_rate);
            window
                .window
                .set_monitor(WindowMode::FullScreen(monitor), target.x, target.y, w, h, refresh);
            Ok(())
        })
    }

    fn dispatch_pending(&mut self, ctx: &mut Context<GlfwWindow>) {
        let Some(glfw) = self.glfw.as_mut() else {
            return;
        };
        glfw.poll_events();

        let mut pending = Vec::new();
        for (handle, record) in ctx.windows_mut() {
            for (_, event) in glfw::flush_messages(&record.native.events) {
                if matches!(event, WindowEvent::Close) {
                    // the shim keeps its own latch
                    record.native.window.set_should_close(false);
                }
                if let Some(notification) = notification(event) {
                    pending.push((handle, notification));
                }
            }
        }

        for (handle, notification) in pending {
            self.channel.dispatch(ctx, handle, notification);
        }
    }

    fn make_current(&mut self, window: &mut GlfwWindow) -> Result<GlfwContext, ShimError> {
        window.window.make_current();
        Ok(GlfwContext(window.window.window_ptr()))
    }

    fn swap_buffers(&mut self, window: &mut GlfwWindow) -> Result<(), ShimError> {
        window.window.swap_buffers();
        Ok(())
    }

    fn poll_event(&mut self, ctx: &mut Context<GlfwWindow>, out: &mut Event) -> bool {
        self.dispatch_pending(ctx);
        self.channel.poll(ctx, out)
    }
}
