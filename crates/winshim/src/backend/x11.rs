//! X11/GLX backend
//!
//! Poll driven: every poll pulls at most one pending Xlib event, decodes it
//! into a [`RawEvent`] and lets the [`PollChannel`] translate it. Nothing is
//! queued on the shim side.
//!
//! Contexts are legacy GLX contexts created from `glXChooseVisual`; the
//! version and profile hints of [`GlConfig`] are not applied here, only the
//! buffer sizes are.

#![allow(unsafe_code)]

use std::{
    ffi::CString,
    mem,
    os::raw::{c_int, c_long, c_uchar, c_uint, c_ulong},
    ptr, slice,
};

use x11::{glx, xlib};

use super::Backend;
use crate::{
    channel::{EventSource, NativeWindow, PollChannel, RawEvent, RawEventKind},
    config::{GlConfig, ShimConfig},
    context::Context,
    error::ShimError,
    event::Event,
    window::{Geometry, Placement, WindowFlags},
};

const NET_WM_STATE_REMOVE: c_long = 0;
const NET_WM_STATE_ADD: c_long = 1;

const EVENT_MASK: c_long = xlib::StructureNotifyMask
    | xlib::ExposureMask
    | xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::FocusChangeMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::PointerMotionMask;

/// Atoms interned once at init
#[derive(Debug, Default, Clone, Copy)]
struct Atoms {
    wm_protocols: xlib::Atom,
    wm_delete_window: xlib::Atom,
    net_wm_state: xlib::Atom,
    net_wm_state_fullscreen: xlib::Atom,
    net_wm_state_maximized_horz: xlib::Atom,
    net_wm_state_maximized_vert: xlib::Atom,
}

impl Atoms {
    fn intern(display: *mut xlib::Display) -> Result<Self, ShimError> {
        let atom = |name: &str| -> Result<xlib::Atom, ShimError> {
            let name = CString::new(name).map_err(|e| ShimError::Init(e.to_string()))?;
            // SAFETY: display is open and name is NUL terminated
            Ok(unsafe { xlib::XInternAtom(display, name.as_ptr(), xlib::False) })
        };

        Ok(Self {
            wm_protocols: atom("WM_PROTOCOLS")?,
            wm_delete_window: atom("WM_DELETE_WINDOW")?,
            net_wm_state: atom("_NET_WM_STATE")?,
            net_wm_state_fullscreen: atom("_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_maximized_horz: atom("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_maximized_vert: atom("_NET_WM_STATE_MAXIMIZED_VERT")?,
        })
    }
}

/// GLX context handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X11Context(pub glx::GLXContext);

/// Native half of an X11 window
#[derive(Debug)]
pub struct X11Window {
    window: xlib::Window,
    context: glx::GLXContext,
}

impl NativeWindow for X11Window {
    fn native_id(&self) -> u64 {
        u64::from(self.window)
    }
}

/// X11/GLX windowing backend
#[derive(Debug)]
pub struct X11Backend {
    display: *mut xlib::Display,
    screen: c_int,
    atoms: Atoms,
    channel: PollChannel,
    gl: GlConfig,
}

impl Default for X11Backend {
    fn default() -> Self {
        Self {
            display: ptr::null_mut(),
            screen: 0,
            atoms: Atoms::default(),
            channel: PollChannel::new(),
            gl: GlConfig::default(),
        }
    }
}

impl X11Backend {
    /// Create an unconnected backend
    pub fn new() -> Self {
        Self::default()
    }

    fn display(&self) -> Result<*mut xlib::Display, ShimError> {
        if self.display.is_null() {
            Err(ShimError::Init("X display is not open".to_string()))
        } else {
            Ok(self.display)
        }
    }

    /// Send a `_NET_WM_STATE` client message for `window` to the root window
    fn send_wm_state(&self, window: xlib::Window, action: c_long, first: xlib::Atom, second: xlib::Atom) {
        let mut data = xlib::ClientMessageData::new();
        data.set_long(0, action);
        #[allow(clippy::cast_possible_wrap)]
        {
            data.set_long(1, first as c_long);
            data.set_long(2, second as c_long);
        }

        let message = xlib::XClientMessageEvent {
            type_: xlib::ClientMessage,
            serial: 0,
            send_event: xlib::True,
            display: self.display,
            window,
            message_type: self.atoms.net_wm_state,
            format: 32,
            data,
        };
        let mut event = xlib::XEvent { client_message: message };

        // SAFETY: display is open and the event is fully initialized
        unsafe {
            let root = xlib::XRootWindow(self.display, self.screen);
            xlib::XSendEvent(
                self.display,
                root,
                xlib::False,
                xlib::SubstructureRedirectMask | xlib::SubstructureNotifyMask,
                &mut event,
            );
            xlib::XFlush(self.display);
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn visual_attribs(&self) -> [c_int; 13] {
        [
            glx::GLX_RGBA,
            glx::GLX_DOUBLEBUFFER,
            glx::GLX_RED_SIZE,
            self.gl.red_bits as c_int,
            glx::GLX_GREEN_SIZE,
            self.gl.green_bits as c_int,
            glx::GLX_BLUE_SIZE,
            self.gl.blue_bits as c_int,
            glx::GLX_DEPTH_SIZE,
            self.gl.depth_bits as c_int,
            glx::GLX_STENCIL_SIZE,
            self.gl.stencil_bits as c_int,
            0,
        ]
    }
}

/// Reads pending events straight off the display connection
struct XlibSource<'a> {
    display: *mut xlib::Display,
    atoms: &'a Atoms,
}

impl XlibSource<'_> {
    /// Whether the window manager reports `window` as maximized both ways
    fn is_maximized(&self, window: xlib::Window) -> bool {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut count: c_ulong = 0;
        let mut remaining: c_ulong = 0;
        let mut data: *mut c_uchar = ptr::null_mut();

        // SAFETY: all out pointers are valid; the returned buffer is freed below
        let status = unsafe {
            xlib::XGetWindowProperty(
                self.display,
                window,
                self.atoms.net_wm_state,
                0,
                1024,
                xlib::False,
                xlib::XA_ATOM,
                &mut actual_type,
                &mut actual_format,
                &mut count,
                &mut remaining,
                &mut data,
            )
        };
        if status != 0 || data.is_null() {
            return false;
        }

        #[allow(clippy::cast_possible_truncation)]
        // SAFETY: format 32 properties are returned as an array of longs
        let states = unsafe { slice::from_raw_parts(data.cast::<xlib::Atom>(), count as usize) };
        let horz = states.contains(&self.atoms.net_wm_state_maximized_horz);
        let vert = states.contains(&self.atoms.net_wm_state_maximized_vert);
        // SAFETY: data was allocated by Xlib
        unsafe { xlib::XFree(data.cast()) };
        horz && vert
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn decode(&self, event: &mut xlib::XEvent) -> RawEvent {
        // SAFETY: every union field read below matches the event type
        unsafe {
            let window = event.any.window;
            let kind = match event.get_type() {
                xlib::ClientMessage => {
                    let message = event.client_message;
                    let protocol = message.data.get_long(0) as xlib::Atom;
                    if message.message_type == self.atoms.wm_protocols && protocol == self.atoms.wm_delete_window {
                        RawEventKind::DeleteWindow
                    } else {
                        RawEventKind::Other
                    }
                }
                xlib::FocusIn => RawEventKind::FocusIn,
                xlib::FocusOut => RawEventKind::FocusOut,
                xlib::ConfigureNotify => {
                    let configure = event.configure;
                    RawEventKind::Configure {
                        geometry: Geometry::new(configure.x, configure.y, configure.width, configure.height),
                        maximized: self.is_maximized(configure.window),
                    }
                }
                xlib::MapNotify => RawEventKind::Map,
                xlib::UnmapNotify => RawEventKind::Unmap,
                xlib::Expose if event.expose.count == 0 => RawEventKind::Expose,
                xlib::KeyPress | xlib::KeyRelease => {
                    let key = event.key;
                    let keysym = xlib::XkbKeycodeToKeysym(self.display, key.keycode as xlib::KeyCode, 0, 0);
                    let keycode = key.keycode;
                    let state = key.state;
                    if event.get_type() == xlib::KeyPress {
                        RawEventKind::KeyPress { keycode, keysym: u64::from(keysym), state }
                    } else {
                        RawEventKind::KeyRelease { keycode, keysym: u64::from(keysym), state }
                    }
                }
                xlib::ButtonPress => RawEventKind::ButtonPress {
                    button: event.button.button,
                    state: event.button.state,
                },
                xlib::ButtonRelease => RawEventKind::ButtonRelease {
                    button: event.button.button,
                    state: event.button.state,
                },
                xlib::MotionNotify => RawEventKind::Motion {
                    x: event.motion.x,
                    y: event.motion.y,
                },
                _ => RawEventKind::Other,
            };
            RawEvent {
                window: u64::from(window),
                kind,
            }
        }
    }
}

impl EventSource for XlibSource<'_> {
    fn next_pending(&mut self) -> Option<RawEvent> {
        if self.display.is_null() {
            return None;
        }
        // SAFETY: display is open; XPending never blocks
        unsafe {
            if xlib::XPending(self.display) == 0 {
                return None;
            }
            let mut event: xlib::XEvent = mem::zeroed();
            xlib::XNextEvent(self.display, &mut event);
            Some(self.decode(&mut event))
        }
    }
}

impl Backend for X11Backend {
    type Window = X11Window;
    type GlContext = X11Context;

    const NAME: &'static str = "x11";
    const ID: &'static str = "02";
    const VERSION: &'static str = "0.1.0";

    fn init(&mut self, config: &ShimConfig) -> Result<(), ShimError> {
        // SAFETY: plain Xlib/GLX setup calls on a display we own
        unsafe {
            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(ShimError::GlContext(
                    "Failed to open X display, check DISPLAY".to_string(),
                ));
            }

            let (mut error_base, mut event_base) = (0, 0);
            if glx::glXQueryExtension(display, &mut error_base, &mut event_base) == 0 {
                xlib::XCloseDisplay(display);
                return Err(ShimError::GlContext("GLX extension not available".to_string()));
            }

            let atoms = match Atoms::intern(display) {
                Ok(atoms) => atoms,
                Err(e) => {
                    xlib::XCloseDisplay(display);
                    return Err(e);
                }
            };

            let mut supported = xlib::False;
            xlib::XkbSetDetectableAutoRepeat(display, xlib::True, &mut supported);
            if supported == xlib::False {
                log::warn!("Detectable auto-repeat unsupported, repeats arrive as release/press pairs");
            }

            self.display = display;
            self.screen = xlib::XDefaultScreen(display);
            self.atoms = atoms;
        }

        self.channel.reset();
        self.gl = config.gl.clone();
        log::debug!("Opened X display, screen {}", self.screen);
        Ok(())
    }

    fn terminate(&mut self) {
        if !self.display.is_null() {
            // SAFETY: every window on this display is already destroyed
            unsafe { xlib::XCloseDisplay(self.display) };
            self.display = ptr::null_mut();
        }
        self.channel.reset();
    }

    fn primary_display(&mut self) -> Result<Geometry, ShimError> {
        let display = self.display()?;
        // SAFETY: display is open
        let (w, h) = unsafe {
            (
                xlib::XDisplayWidth(display, self.screen),
                xlib::XDisplayHeight(display, self.screen),
            )
        };
        Ok(Geometry::new(0, 0, w, h))
    }

    #[allow(clippy::cast_sign_loss)]
    fn create_window(
        &mut self,
        title: &str,
        flags: WindowFlags,
        placement: &Placement,
        _config: &ShimConfig,
    ) -> Result<X11Window, ShimError> {
        let display = self.display()?;
        let title = CString::new(title).map_err(|_| ShimError::Window("Window title contains NUL".to_string()))?;
        let geometry = placement.geometry();
        let mut attribs = self.visual_attribs();

        // SAFETY: display is open; partially created resources are released
        // before every early return
        let native = unsafe {
            let root = xlib::XRootWindow(display, self.screen);
            let window = xlib::XCreateSimpleWindow(
                display,
                root,
                geometry.x,
                geometry.y,
                geometry.w as c_uint,
                geometry.h as c_uint,
                0,
                xlib::XBlackPixel(display, self.screen),
                xlib::XWhitePixel(display, self.screen),
            );
            if window == 0 {
                return Err(ShimError::Window("Failed to create X11 window".to_string()));
            }

            xlib::XStoreName(display, window, title.as_ptr());
            let mut protocols = [self.atoms.wm_delete_window];
            if xlib::XSetWMProtocols(display, window, protocols.as_mut_ptr(), 1) == 0 {
                xlib::XDestroyWindow(display, window);
                return Err(ShimError::Window("Failed to set WM protocols".to_string()));
            }
            xlib::XSelectInput(display, window, EVENT_MASK);

            let visual = glx::glXChooseVisual(display, self.screen, attribs.as_mut_ptr());
            if visual.is_null() {
                xlib::XDestroyWindow(display, window);
                return Err(ShimError::GlContext("Failed to choose GLX visual".to_string()));
            }
            let context = glx::glXCreateContext(display, visual, ptr::null_mut(), xlib::True);
            xlib::XFree(visual.cast());
            if context.is_null() {
                xlib::XDestroyWindow(display, window);
                return Err(ShimError::GlContext("Failed to create GLX context".to_string()));
            }
            glx::glXMakeCurrent(display, window, context);

            if flags.contains(WindowFlags::SHOWN) {
                xlib::XMapWindow(display, window);
            }
            X11Window { window, context }
        };

        match placement {
            Placement::Fullscreen(_) => {
                self.send_wm_state(native.window, NET_WM_STATE_ADD, self.atoms.net_wm_state_fullscreen, 0);
            }
            Placement::Maximized(_) => self.send_wm_state(
                native.window,
                NET_WM_STATE_ADD,
                self.atoms.net_wm_state_maximized_horz,
                self.atoms.net_wm_state_maximized_vert,
            ),
            Placement::Centered(g) | Placement::Explicit(g) => {
                // SAFETY: window was created above on this display
                unsafe {
                    xlib::XMoveWindow(display, native.window, g.x, g.y);
                    xlib::XFlush(display);
                }
            }
        }
        Ok(native)
    }

    fn destroy_window(&mut self, window: X11Window) {
        if self.display.is_null() {
            return;
        }
        // SAFETY: window and context belong to this display
        unsafe {
            glx::glXMakeCurrent(self.display, 0, ptr::null_mut());
            glx::glXDestroyContext(self.display, window.context);
            xlib::XDestroyWindow(self.display, window.window);
            xlib::XFlush(self.display);
        }
    }

    fn request_close(&mut self, _window: &mut X11Window) {
        // the shim's close latch is all the X11 side needs
    }

    #[allow(clippy::cast_sign_loss)]
    fn set_fullscreen(&mut self, window: &mut X11Window, entering: bool, target: Geometry) -> Result<(), ShimError> {
        let display = self.display()?;
        let action = if entering { NET_WM_STATE_ADD } else { NET_WM_STATE_REMOVE };
        self.send_wm_state(window.window, action, self.atoms.net_wm_state_fullscreen, 0);

        if !entering {
            // SAFETY: window belongs to this display
            unsafe {
                xlib::XMoveResizeWindow(
                    display,
                    window.window,
                    target.x,
                    target.y,
                    target.w as c_uint,
                    target.h as c_uint,
                );
                xlib::XFlush(display);
            }
        }
        Ok(())
    }

    fn make_current(&mut self, window: &mut X11Window) -> Result<X11Context, ShimError> {
        let display = self.display()?;
        // SAFETY: window and context belong to this display
        if unsafe { glx::glXMakeCurrent(display, window.window, window.context) } == 0 {
            return Err(ShimError::GlContext("glXMakeCurrent failed".to_string()));
        }
        Ok(X11Context(window.context))
    }

    fn swap_buffers(&mut self, window: &mut X11Window) -> Result<(), ShimError> {
        let display = self.display()?;
        // SAFETY: window belongs to this display
        unsafe { glx::glXSwapBuffers(display, window.window) };
        Ok(())
    }

    fn poll_event(&mut self, ctx: &mut Context<X11Window>, out: &mut Event) -> bool {
        let mut source = XlibSource {
            display: self.display,
            atoms: &self.atoms,
        };
        self.channel.poll(ctx, &mut source, out)
    }
}
