//! Callback-driven delivery

use super::{take_close_latch, EventQueue};
use crate::{
    context::Context,
    event::{
        copy_drop_paths, Event, KeyEvent, MouseButtonEvent, MouseMotionEvent, MoveEvent, ResizeEvent,
        WheelEvent,
    },
    input::{translate_glfw_key, MouseButton, NativeModifiers},
    window::{WindowHandle, WindowState},
};

/// GLFW's "unknown key" code
const UNKNOWN_KEY: i32 = -1;

/// Key transition reported by the native layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Key released
    Release,
    /// Key pressed
    Press,
    /// Key held long enough to auto-repeat
    Repeat,
}

/// A native notification, as raised from within the native event pump
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Key transition with a GLFW key code
    Key {
        /// Native key code, -1 when unknown
        key: i32,
        /// Transition
        action: KeyAction,
        /// Merged modifier bits
        mods: NativeModifiers,
    },
    /// Window size changed
    Resized {
        /// New width
        w: i32,
        /// New height
        h: i32,
    },
    /// Window position changed
    Moved {
        /// New x position
        x: i32,
        /// New y position
        y: i32,
    },
    /// Window iconified (`true`) or restored (`false`)
    Iconified(bool),
    /// Window maximized (`true`) or restored (`false`)
    Maximized(bool),
    /// Window focused (`true`) or unfocused (`false`)
    Focused(bool),
    /// Window contents damaged
    Refresh,
    /// Paths dropped onto the window; only valid for the notification
    Dropped(Vec<String>),
    /// Mouse button transition
    MouseButton {
        /// Native button index, 0 = left
        button: i32,
        /// Pressed (`true`) or released (`false`)
        pressed: bool,
        /// Merged modifier bits
        mods: NativeModifiers,
    },
    /// Cursor position in window coordinates
    CursorMoved {
        /// Cursor x
        x: f64,
        /// Cursor y
        y: f64,
    },
    /// Scroll offsets
    Scrolled {
        /// Horizontal offset
        x: f64,
        /// Vertical offset
        y: f64,
    },
    /// The user asked to close the window
    CloseRequested,
}

/// Translates notifications as they arrive and queues the results
#[derive(Debug, Default)]
pub struct CallbackChannel {
    queue: EventQueue,
}

impl CallbackChannel {
    /// Create a channel whose queue starts with room for `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: EventQueue::with_capacity(capacity),
        }
    }

    /// Translate `notification` for `window` and queue the resulting event
    ///
    /// Window state is updated before the event is queued. Notifications
    /// for windows other than the active one are ignored.
    pub fn dispatch<N>(&mut self, ctx: &mut Context<N>, window: WindowHandle, notification: Notification) {
        if window != ctx.active() {
            log::trace!("Ignoring notification for inactive window: {notification:?}");
            return;
        }

        if let Some(event) = Self::translate(ctx, window, notification) {
            self.queue.push(event, ctx.allocator.as_mut(), &mut ctx.errors);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn translate<N>(ctx: &mut Context<N>, window: WindowHandle, notification: Notification) -> Option<Event> {
        let event = match notification {
            Notification::Key { key, action, mods } => {
                if key == UNKNOWN_KEY {
                    log::debug!("Dropping key notification with unknown key");
                    return None;
                }
                let keycode = translate_glfw_key(key);
                let pressed = action != KeyAction::Release;
                ctx.modifiers.track(keycode, pressed);
                let key = KeyEvent {
                    keycode,
                    repeat: action == KeyAction::Repeat,
                    mods: ctx.modifiers.translate(mods),
                };
                if pressed {
                    Event::KeyDown(key)
                } else {
                    Event::KeyUp(key)
                }
            }
            Notification::Resized { w, h } => {
                let state = state_mut(ctx, window)?;
                state.on_resize(w, h);
                Event::WindowResized(ResizeEvent {
                    w,
                    h,
                    is_fullscreen: state.is_fullscreen(),
                })
            }
            Notification::Moved { x, y } => {
                let state = state_mut(ctx, window)?;
                state.on_move(x, y);
                if !state.tracks_restore() {
                    return None;
                }
                Event::WindowMoved(MoveEvent { x, y })
            }
            Notification::Iconified(iconified) => {
                state_mut(ctx, window)?.on_minimize(iconified);
                if iconified {
                    Event::WindowMinimized
                } else {
                    Event::WindowRestored
                }
            }
            Notification::Maximized(maximized) => {
                state_mut(ctx, window)?.on_maximize(maximized);
                if maximized {
                    Event::WindowMaximized
                } else {
                    Event::WindowRestored
                }
            }
            Notification::Focused(focused) => {
                state_mut(ctx, window)?.on_focus(focused);
                if focused {
                    Event::WindowFocusGained
                } else {
                    Event::WindowFocusLost
                }
            }
            Notification::Refresh => Event::WindowExposed,
            Notification::Dropped(paths) => {
                Event::Drop(copy_drop_paths(&paths, ctx.allocator.as_mut(), &mut ctx.errors))
            }
            Notification::MouseButton { button, pressed, mods } => {
                let button = MouseButtonEvent {
                    button: MouseButton(button),
                    mods: ctx.modifiers.translate(mods),
                };
                if pressed {
                    Event::MouseButtonDown(button)
                } else {
                    Event::MouseButtonUp(button)
                }
            }
            Notification::CursorMoved { x, y } => Event::MouseMoved(MouseMotionEvent {
                x: x as i32,
                y: y as i32,
            }),
            Notification::Scrolled { x, y } => Event::MouseWheel(WheelEvent {
                x_offset: x,
                y_offset: y,
            }),
            Notification::CloseRequested => {
                state_mut(ctx, window)?.request_close();
                return None;
            }
        };
        Some(event)
    }

    /// Deliver the oldest queued event into `out`
    ///
    /// The drop paths of whatever `out` held before are released first.
    /// With an empty queue the close latch is consulted.
    pub fn poll<N>(&mut self, ctx: &mut Context<N>, out: &mut Event) -> bool {
        out.clear_drop_paths();
        if let Some(event) = self.queue.pop() {
            *out = event;
            return true;
        }
        take_close_latch(ctx, out)
    }

    /// Number of events waiting to be polled
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drop all queued events, releasing their drop paths
    pub fn release(&mut self) {
        let dropped = self.queue.drain_and_release();
        if dropped > 0 {
            log::debug!("Released {dropped} undelivered events");
        }
    }
}

fn state_mut<N>(ctx: &mut Context<N>, window: WindowHandle) -> Option<&mut WindowState> {
    ctx.record_mut(window).map(|record| &mut record.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ShimConfig,
        event::EventType,
        input::{Keycode, Modifiers},
        window::{Geometry, Placement, WindowFlags, WindowRecord},
    };

    fn setup() -> (Context<()>, WindowHandle, CallbackChannel) {
        let mut ctx = Context::new(ShimConfig::default());
        let g = Geometry::new(100, 100, 640, 480);
        let state = WindowState::new("test", WindowFlags::SHOWN, g, Placement::Explicit(g));
        let handle = ctx.insert_window(WindowRecord::new(state, ()));
        (ctx, handle, CallbackChannel::with_capacity(4))
    }

    fn drain(channel: &mut CallbackChannel, ctx: &mut Context<()>) -> Vec<Event> {
        let mut out = Event::None;
        let mut events = Vec::new();
        while channel.poll(ctx, &mut out) {
            events.push(out.clone());
        }
        events
    }

    #[test]
    fn test_fifo_through_poll() {
        let (mut ctx, window, mut channel) = setup();
        channel.dispatch(&mut ctx, window, Notification::Focused(true));
        channel.dispatch(&mut ctx, window, Notification::Resized { w: 800, h: 600 });
        channel.dispatch(&mut ctx, window, Notification::Refresh);

        let tags: Vec<_> = drain(&mut channel, &mut ctx).iter().map(Event::event_type).collect();
        assert_eq!(
            tags,
            [EventType::WindowFocusGained, EventType::WindowResized, EventType::WindowExposed]
        );
    }

    #[test]
    fn test_unknown_key_dropped() {
        let (mut ctx, window, mut channel) = setup();
        channel.dispatch(&mut ctx, window, Notification::Key {
            key: -1,
            action: KeyAction::Press,
            mods: NativeModifiers::empty(),
        });
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn test_key_repeat_and_modifiers() {
        let (mut ctx, window, mut channel) = setup();
        let shift = NativeModifiers::SHIFT;
        channel.dispatch(&mut ctx, window, Notification::Key {
            key: 340,
            action: KeyAction::Press,
            mods: shift,
        });
        channel.dispatch(&mut ctx, window, Notification::Key { key: 65, action: KeyAction::Repeat, mods: shift });
        channel.dispatch(&mut ctx, window, Notification::Key { key: 65, action: KeyAction::Release, mods: shift });

        let events = drain(&mut channel, &mut ctx);
        assert_eq!(events.len(), 3);

        // the modifier's own key-down already carries its side bit
        assert_eq!(events[0].key().map(|k| k.mods), Some(Modifiers::LSHIFT));

        let Event::KeyDown(repeat) = &events[1] else { panic!("expected key down") };
        assert_eq!(repeat.keycode, Keycode::A);
        assert!(repeat.repeat);
        assert_eq!(repeat.mods, Modifiers::LSHIFT);

        let Event::KeyUp(up) = &events[2] else { panic!("expected key up") };
        assert!(!up.repeat);
    }

    #[test]
    fn test_move_suppressed_while_fullscreen() {
        let (mut ctx, window, mut channel) = setup();
        if let Some(state) = ctx.active_state_mut() {
            state.enter_fullscreen(Geometry::new(0, 0, 1920, 1080));
        }

        channel.dispatch(&mut ctx, window, Notification::Moved { x: 5, y: 5 });
        assert_eq!(channel.pending(), 0);

        let state = &ctx.record(window).unwrap().state;
        assert_eq!(state.geometry(), Geometry::new(5, 5, 1920, 1080));
        assert_eq!(state.restore(), Geometry::new(100, 100, 640, 480));
    }

    #[test]
    fn test_move_reported_while_windowed() {
        let (mut ctx, window, mut channel) = setup();
        channel.dispatch(&mut ctx, window, Notification::Moved { x: 5, y: 7 });

        let events = drain(&mut channel, &mut ctx);
        assert_eq!(events, [Event::WindowMoved(MoveEvent { x: 5, y: 7 })]);
        assert_eq!(ctx.record(window).map(|r| r.state.restore().x), Some(5));
    }

    #[test]
    fn test_close_latch_yields_one_quit() {
        let (mut ctx, window, mut channel) = setup();
        channel.dispatch(&mut ctx, window, Notification::Focused(false));
        channel.dispatch(&mut ctx, window, Notification::CloseRequested);

        let tags: Vec<_> = drain(&mut channel, &mut ctx).iter().map(Event::event_type).collect();
        assert_eq!(tags, [EventType::WindowFocusLost, EventType::Quit]);
    }

    #[test]
    fn test_drop_paths_released_on_next_poll() {
        let (mut ctx, window, mut channel) = setup();
        channel.dispatch(&mut ctx, window, Notification::Dropped(vec!["/a".into(), "/b".into()]));

        let mut out = Event::None;
        assert!(channel.poll(&mut ctx, &mut out));
        assert_eq!(out.drop_event().map(|d| d.paths().count()), Some(2));

        assert!(!channel.poll(&mut ctx, &mut out));
        assert_eq!(out.drop_event().map(|d| d.paths().count()), Some(0));
    }

    #[test]
    fn test_inactive_window_ignored() {
        let (mut ctx, first, mut channel) = setup();
        let g = Geometry::new(0, 0, 10, 10);
        ctx.insert_window(WindowRecord::new(WindowState::new("second", WindowFlags::SHOWN, g, Placement::Explicit(g)), ()));

        channel.dispatch(&mut ctx, first, Notification::Refresh);
        assert_eq!(channel.pending(), 0);
    }
}
