//! Poll-driven delivery

use std::collections::HashSet;

use super::take_close_latch;
use crate::{
    context::Context,
    event::{Event, KeyEvent, MouseButtonEvent, MouseMotionEvent, MoveEvent, ResizeEvent, WheelEvent},
    input::{translate_x11_keysym, MouseButton, NativeModifiers},
    window::{ConfigureChange, Geometry},
};

/// A native event, decoded just enough to translate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Native id of the window the event is addressed to
    pub window: u64,
    /// What happened
    pub kind: RawEventKind,
}

/// Native event kinds the poll channel understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEventKind {
    /// Window manager delete request
    DeleteWindow,
    /// Keyboard focus arrived
    FocusIn,
    /// Keyboard focus left
    FocusOut,
    /// Position and/or size changed
    Configure {
        /// New geometry
        geometry: Geometry,
        /// Window manager state hints report maximized
        maximized: bool,
    },
    /// Window mapped
    Map,
    /// Window unmapped
    Unmap,
    /// Window contents damaged
    Expose,
    /// Key pressed
    KeyPress {
        /// Hardware key code, used to detect auto-repeat
        keycode: u32,
        /// Unshifted keysym
        keysym: u64,
        /// Core protocol modifier state
        state: u32,
    },
    /// Key released
    KeyRelease {
        /// Hardware key code
        keycode: u32,
        /// Unshifted keysym
        keysym: u64,
        /// Core protocol modifier state
        state: u32,
    },
    /// Pointer button pressed (wheel steps arrive as buttons 4-7)
    ButtonPress {
        /// Core button number
        button: u32,
        /// Core protocol modifier state
        state: u32,
    },
    /// Pointer button released
    ButtonRelease {
        /// Core button number
        button: u32,
        /// Core protocol modifier state
        state: u32,
    },
    /// Pointer moved
    Motion {
        /// Pointer x in window pixels
        x: i32,
        /// Pointer y in window pixels
        y: i32,
    },
    /// Anything else
    Other,
}

/// Synchronous source of pending native events
pub trait EventSource {
    /// Pull the next pending event without blocking
    fn next_pending(&mut self) -> Option<RawEvent>;
}

/// Native window that can be matched against [`RawEvent::window`]
pub trait NativeWindow {
    /// Native id of the window
    fn native_id(&self) -> u64;
}

/// Translates at most one native event per poll, without queuing
#[derive(Debug, Default)]
pub struct PollChannel {
    held_keys: HashSet<u32>,
}

impl PollChannel {
    /// Create a channel with no keys held
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull and translate at most one pending event into `out`
    ///
    /// Events addressed to other windows and events without a unified
    /// counterpart are consumed without output. When nothing was produced
    /// the close latch is consulted.
    pub fn poll<N, S>(&mut self, ctx: &mut Context<N>, source: &mut S, out: &mut Event) -> bool
    where
        N: NativeWindow,
        S: EventSource + ?Sized,
    {
        out.clear_drop_paths();

        if let Some(raw) = source.next_pending() {
            let active = ctx.record(ctx.active()).map(|record| record.native.native_id());
            if active == Some(raw.window) {
                if let Some(event) = self.translate(ctx, raw.kind) {
                    *out = event;
                    return true;
                }
            } else {
                log::trace!("Ignoring event for window {:#x}", raw.window);
            }
        }

        take_close_latch(ctx, out)
    }

    /// Translate one native event for the active window
    pub fn translate<N>(&mut self, ctx: &mut Context<N>, kind: RawEventKind) -> Option<Event> {
        let event = match kind {
            RawEventKind::DeleteWindow => Event::Quit,
            RawEventKind::FocusIn => {
                ctx.active_state_mut()?.on_focus(true);
                Event::WindowFocusGained
            }
            RawEventKind::FocusOut => {
                // releases may be delivered elsewhere while unfocused
                self.held_keys.clear();
                ctx.active_state_mut()?.on_focus(false);
                Event::WindowFocusLost
            }
            RawEventKind::Configure { geometry, maximized } => {
                let state = ctx.active_state_mut()?;
                let maximized = maximized && !state.is_fullscreen();
                state.on_maximize(maximized);
                match state.on_configure(geometry) {
                    ConfigureChange::Resized => Event::WindowResized(ResizeEvent {
                        w: geometry.w,
                        h: geometry.h,
                        is_fullscreen: state.is_fullscreen(),
                    }),
                    ConfigureChange::Moved => Event::WindowMoved(MoveEvent {
                        x: geometry.x,
                        y: geometry.y,
                    }),
                    ConfigureChange::Unchanged if maximized => Event::WindowMaximized,
                    ConfigureChange::Unchanged => return None,
                }
            }
            RawEventKind::Map => {
                ctx.active_state_mut()?.on_map(true);
                Event::WindowRestored
            }
            RawEventKind::Unmap => {
                ctx.active_state_mut()?.on_map(false);
                Event::WindowMinimized
            }
            RawEventKind::Expose => Event::WindowExposed,
            RawEventKind::KeyPress { keycode, keysym, state } => {
                let repeat = !self.held_keys.insert(keycode);
                let keycode = translate_x11_keysym(keysym);
                ctx.modifiers.track(keycode, true);
                Event::KeyDown(KeyEvent {
                    keycode,
                    repeat,
                    mods: ctx.modifiers.translate(NativeModifiers::from_x11_state(state)),
                })
            }
            RawEventKind::KeyRelease { keycode, keysym, state } => {
                self.held_keys.remove(&keycode);
                let keycode = translate_x11_keysym(keysym);
                ctx.modifiers.track(keycode, false);
                Event::KeyUp(KeyEvent {
                    keycode,
                    repeat: false,
                    mods: ctx.modifiers.translate(NativeModifiers::from_x11_state(state)),
                })
            }
            RawEventKind::ButtonPress { button, state } => match wheel_step(button) {
                Some(wheel) => Event::MouseWheel(wheel),
                None => Event::MouseButtonDown(MouseButtonEvent {
                    button: MouseButton::from_x11(button),
                    mods: ctx.modifiers.translate(NativeModifiers::from_x11_state(state)),
                }),
            },
            RawEventKind::ButtonRelease { button, state } => {
                if wheel_step(button).is_some() {
                    return None;
                }
                Event::MouseButtonUp(MouseButtonEvent {
                    button: MouseButton::from_x11(button),
                    mods: ctx.modifiers.translate(NativeModifiers::from_x11_state(state)),
                })
            }
            RawEventKind::Motion { x, y } => Event::MouseMoved(MouseMotionEvent { x, y }),
            RawEventKind::Other => return None,
        };
        Some(event)
    }

    /// Forget held keys
    pub fn reset(&mut self) {
        self.held_keys.clear();
    }
}

/// Scroll step encoded by core buttons 4-7
const fn wheel_step(button: u32) -> Option<WheelEvent> {
    let (x_offset, y_offset) = match button {
        4 => (0.0, 1.0),
        5 => (0.0, -1.0),
        6 => (-1.0, 0.0),
        7 => (1.0, 0.0),
        _ => return None,
    };
    Some(WheelEvent { x_offset, y_offset })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        config::ShimConfig,
        event::EventType,
        input::{Keycode, Modifiers},
        window::{Placement, WindowFlags, WindowRecord, WindowState},
    };

    const WINDOW: u64 = 0x0040_0001;

    struct FakeWindow(u64);

    impl NativeWindow for FakeWindow {
        fn native_id(&self) -> u64 {
            self.0
        }
    }

    #[derive(Default)]
    struct Script(VecDeque<RawEvent>);

    impl Script {
        fn push(&mut self, kind: RawEventKind) {
            self.0.push_back(RawEvent { window: WINDOW, kind });
        }
    }

    impl EventSource for Script {
        fn next_pending(&mut self) -> Option<RawEvent> {
            self.0.pop_front()
        }
    }

    fn setup() -> Context<FakeWindow> {
        let mut ctx = Context::new(ShimConfig::default());
        let g = Geometry::new(100, 100, 640, 480);
        let state = WindowState::new("x11", WindowFlags::SHOWN, g, Placement::Explicit(g));
        ctx.insert_window(WindowRecord::new(state, FakeWindow(WINDOW)));
        ctx
    }

    fn poll_all(ctx: &mut Context<FakeWindow>, script: &mut Script) -> Vec<Event> {
        let mut channel = PollChannel::new();
        let mut out = Event::None;
        let mut events = Vec::new();
        while !script.0.is_empty() {
            if channel.poll(ctx, script, &mut out) {
                events.push(out.clone());
            }
        }
        events
    }

    #[test]
    fn test_configure_classification() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::Configure { geometry: Geometry::new(100, 100, 800, 600), maximized: false });
        script.push(RawEventKind::Configure { geometry: Geometry::new(50, 60, 800, 600), maximized: false });
        script.push(RawEventKind::Configure { geometry: Geometry::new(50, 60, 800, 600), maximized: false });
        script.push(RawEventKind::Configure { geometry: Geometry::new(50, 60, 800, 600), maximized: true });

        let events = poll_all(&mut ctx, &mut script);
        assert_eq!(
            events,
            [
                Event::WindowResized(ResizeEvent { w: 800, h: 600, is_fullscreen: false }),
                Event::WindowMoved(MoveEvent { x: 50, y: 60 }),
                Event::WindowMaximized,
            ]
        );
        let state = ctx.active_state_mut().unwrap();
        assert_eq!(state.restore(), Geometry::new(50, 60, 800, 600));
        assert!(state.is_maximized());
    }

    #[test]
    fn test_maximize_follows_wm_state_on_resize() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::Configure { geometry: Geometry::new(0, 30, 1920, 1050), maximized: true });

        let events = poll_all(&mut ctx, &mut script);
        assert_eq!(events[0].event_type(), EventType::WindowResized);
        assert!(ctx.active_state_mut().unwrap().is_maximized());

        script.push(RawEventKind::Configure { geometry: Geometry::new(0, 30, 640, 480), maximized: false });
        let events = poll_all(&mut ctx, &mut script);
        assert_eq!(events[0].event_type(), EventType::WindowResized);
        assert!(!ctx.active_state_mut().unwrap().is_maximized());
    }

    #[test]
    fn test_letters_and_repeat() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::KeyPress { keycode: 24, keysym: u64::from(b'q'), state: 0 });
        script.push(RawEventKind::KeyPress { keycode: 24, keysym: u64::from(b'q'), state: 0 });
        script.push(RawEventKind::KeyRelease { keycode: 24, keysym: u64::from(b'q'), state: 0 });
        script.push(RawEventKind::KeyPress { keycode: 24, keysym: u64::from(b'Q'), state: 1 });

        let events = poll_all(&mut ctx, &mut script);
        let keys: Vec<_> = events.iter().filter_map(Event::key).map(|k| (k.keycode, k.repeat)).collect();
        assert_eq!(
            keys,
            [(Keycode::Q, false), (Keycode::Q, true), (Keycode::Q, false), (Keycode::Q, false)]
        );
        assert_eq!(events[2].event_type(), EventType::KeyUp);
    }

    #[test]
    fn test_shift_side_tracking() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::KeyPress { keycode: 62, keysym: 0xffe2, state: 0 });
        script.push(RawEventKind::KeyPress { keycode: 38, keysym: u64::from(b'a'), state: 0x01 });

        let events = poll_all(&mut ctx, &mut script);
        assert_eq!(events[1].key().map(|k| k.mods), Some(Modifiers::RSHIFT));
    }

    #[test]
    fn test_wheel_and_buttons() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::ButtonPress { button: 4, state: 0 });
        script.push(RawEventKind::ButtonRelease { button: 4, state: 0 });
        script.push(RawEventKind::ButtonPress { button: 6, state: 0 });
        script.push(RawEventKind::ButtonPress { button: 3, state: 0 });
        script.push(RawEventKind::ButtonRelease { button: 1, state: 0 });

        let events = poll_all(&mut ctx, &mut script);
        assert_eq!(events.len(), 4);

        let Event::MouseWheel(up) = &events[0] else { panic!("expected wheel") };
        assert_relative_eq!(up.y_offset, 1.0);
        assert_relative_eq!(up.x_offset, 0.0);

        let Event::MouseWheel(left) = &events[1] else { panic!("expected wheel") };
        assert_relative_eq!(left.x_offset, -1.0);

        let Event::MouseButtonDown(right) = &events[2] else { panic!("expected button") };
        assert_eq!(right.button, MouseButton::RIGHT);

        let Event::MouseButtonUp(left) = &events[3] else { panic!("expected button") };
        assert_eq!(left.button, MouseButton::LEFT);
    }

    #[test]
    fn test_other_windows_ignored() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.0.push_back(RawEvent { window: WINDOW + 1, kind: RawEventKind::Expose });

        assert!(poll_all(&mut ctx, &mut script).is_empty());
    }

    #[test]
    fn test_delete_window_is_quit() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::DeleteWindow);
        assert_eq!(poll_all(&mut ctx, &mut script), [Event::Quit]);
    }

    #[test]
    fn test_close_latch_when_idle() {
        let mut ctx = setup();
        let mut channel = PollChannel::new();
        let mut script = Script::default();
        let mut out = Event::None;

        assert!(!channel.poll(&mut ctx, &mut script, &mut out));
        ctx.active_state_mut().unwrap().request_close();
        assert!(channel.poll(&mut ctx, &mut script, &mut out));
        assert_eq!(out, Event::Quit);
        assert!(!channel.poll(&mut ctx, &mut script, &mut out));
    }

    #[test]
    fn test_map_unmap() {
        let mut ctx = setup();
        let mut script = Script::default();
        script.push(RawEventKind::Unmap);
        script.push(RawEventKind::Map);
        script.push(RawEventKind::Other);

        let tags: Vec<_> = poll_all(&mut ctx, &mut script).iter().map(Event::event_type).collect();
        assert_eq!(tags, [EventType::WindowMinimized, EventType::WindowRestored]);
    }
}
