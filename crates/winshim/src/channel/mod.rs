//! Event delivery channels
//!
//! Two ways of getting native input to the application:
//!
//! - [`CallbackChannel`]: the native layer pushes notifications while it is
//!   pumped; each one is translated immediately and queued in an
//!   [`EventQueue`], and every poll hands out exactly one queued event.
//! - [`PollChannel`]: nothing is queued; every poll pulls at most one
//!   pending native event from an [`EventSource`] and translates it on the
//!   spot.
//!
//! Both fall back to the active window's close latch when they have nothing
//! else to deliver, turning a pending close request into exactly one quit
//! event.

mod callback;
mod poll;
mod queue;

pub use callback::{CallbackChannel, KeyAction, Notification};
pub use poll::{EventSource, NativeWindow, PollChannel, RawEvent, RawEventKind};
pub use queue::EventQueue;

use crate::{context::Context, event::Event};

/// Produce a quit event if the active window has a pending close request
///
/// The latch is consumed, so a close request yields quit once.
pub(crate) fn take_close_latch<N>(ctx: &mut Context<N>, out: &mut Event) -> bool {
    let Some(state) = ctx.active_state_mut() else {
        return false;
    };
    if !state.take_close_request() {
        return false;
    }
    log::debug!("Close request latched, delivering quit");
    *out = Event::Quit;
    true
}
