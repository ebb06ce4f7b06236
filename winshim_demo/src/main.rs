//! Window and input demo
//!
//! Opens a centered resizable window and logs every event it receives.
//! Q closes the window, F11 toggles fullscreen, dropped files are printed.
//!
//! Build with `--features x11` or `--features glfw` to talk to a real
//! display; without either the mock backend runs and the loop ends at once.

use std::path::PathBuf;

use winshim::{config::ConfigError, logging, prelude::*};

/// Demo failures
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("shim error: {0}")]
    Shim(#[from] ShimError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("window creation failed: {0}")]
    Window(String),
}

fn load_config() -> Result<ShimConfig, DemoError> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            Ok(ShimConfig::load_from_file(path)?)
        }
        None => Ok(ShimConfig::default()),
    }
}

fn run() -> Result<(), DemoError> {
    let mut shim = Shim::with_config(load_config()?);
    shim.init(InitFlags::VIDEO)?;
    log::info!("winshim {}", shim.version());

    let flags = WindowFlags::SHOWN | WindowFlags::CENTERED | WindowFlags::RESIZABLE;
    let window = shim
        .create_window("winshim demo", 0, 0, 800, 600, flags)
        .ok_or_else(|| DemoError::Window(shim.error().to_string()))?;

    if let Some(context) = shim.gl_context(window) {
        log::debug!("GL context {context:?}");
    }

    let mut event = Event::None;
    let mut running = true;
    while running {
        let mut received = false;
        while shim.poll_event(&mut event) {
            received = true;
            match &event {
                Event::Quit => running = false,
                Event::KeyDown(key) if key.keycode == Keycode::Q && !key.repeat => shim.close_window(window),
                Event::KeyDown(key) if key.keycode == Keycode::F11 && !key.repeat => shim.toggle_fullscreen(window),
                Event::Drop(drop) => {
                    for path in drop.paths() {
                        println!("dropped: {path}");
                    }
                }
                other => log::debug!("{other:?}"),
            }
        }

        shim.swap_window(window);

        // the mock backend never produces events on its own
        if !received && DefaultBackend::NAME == "mock" {
            running = false;
        }
    }

    shim.destroy_window(window);
    shim.quit();
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
