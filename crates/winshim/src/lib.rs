//! # winshim
//!
//! A minimal SDL-style window and input event shim. One API, three backends:
//!
//! - **GLFW** (`glfw` feature): callback-driven, notifications are queued
//!   while the native layer is pumped and drained one per poll
//! - **X11/GLX** (`x11` feature): poll-driven, one native event is pulled
//!   and translated per poll with no intermediate queue
//! - **Mock** (always available): a scriptable test double
//!
//! The backend is picked at build time through [`backend::DefaultBackend`];
//! applications only ever talk to [`Shim`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use winshim::prelude::*;
//!
//! fn main() -> Result<(), ShimError> {
//!     let mut shim = Shim::new();
//!     shim.init(InitFlags::VIDEO)?;
//!
//!     let flags = WindowFlags::SHOWN | WindowFlags::CENTERED | WindowFlags::RESIZABLE;
//!     let Some(window) = shim.create_window("Hello", 0, 0, 800, 600, flags) else {
//!         eprintln!("{}", shim.error());
//!         return Ok(());
//!     };
//!
//!     let mut event = Event::None;
//!     let mut running = true;
//!     while running {
//!         while shim.poll_event(&mut event) {
//!             if event.event_type() == EventType::Quit {
//!                 running = false;
//!             }
//!         }
//!         shim.swap_window(window);
//!     }
//!
//!     shim.quit();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod alloc;
pub mod backend;
pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod input;
pub mod logging;
pub mod window;

mod shim;

pub use shim::{InitFlags, Shim, CORE_VERSION};

/// Common imports for shim users
pub mod prelude {
    pub use crate::{
        backend::{Backend, DefaultBackend},
        config::{Config, ShimConfig},
        error::{ErrorKind, ShimError},
        event::{DropEvent, Event, EventType, KeyEvent},
        input::{Keycode, Modifiers, MouseButton},
        window::{Geometry, WindowFlags, WindowHandle},
        InitFlags, Shim,
    };
}
