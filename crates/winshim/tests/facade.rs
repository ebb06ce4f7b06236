//! End-to-end behavior of the facade over the mock backend

use std::collections::VecDeque;

use winshim::{
    alloc::{AllocError, Allocator, SystemAllocator},
    backend::MockBackend,
    channel::{KeyAction, Notification},
    input::NativeModifiers,
    prelude::*,
};

fn shim() -> Shim<MockBackend> {
    shim_on(MockBackend::new())
}

fn shim_on(backend: MockBackend) -> Shim<MockBackend> {
    let mut shim = Shim::with_backend(backend, ShimConfig::default());
    shim.init(InitFlags::VIDEO).unwrap();
    shim
}

fn drain(shim: &mut Shim<MockBackend>) -> Vec<Event> {
    let mut events = Vec::new();
    let mut event = Event::None;
    while shim.poll_event(&mut event) {
        events.push(event.clone());
    }
    events
}

/// Fails every copy whose call index is listed
struct FailingCopies {
    calls: usize,
    failing: Vec<usize>,
}

impl Allocator for FailingCopies {
    fn copy_str(&mut self, source: &str) -> Result<String, AllocError> {
        let index = self.calls;
        self.calls += 1;
        if self.failing.contains(&index) {
            return Err(AllocError::Refused { requested: source.len() });
        }
        SystemAllocator.copy_str(source)
    }

    fn reserve_paths(&mut self, paths: &mut Vec<Option<String>>, additional: usize) -> Result<(), AllocError> {
        SystemAllocator.reserve_paths(paths, additional)
    }

    fn reserve_events(&mut self, queue: &mut VecDeque<Event>, additional: usize) -> Result<(), AllocError> {
        SystemAllocator.reserve_events(queue, additional)
    }
}

#[test]
fn test_centered_window() {
    let mut shim = shim();
    let flags = WindowFlags::SHOWN | WindowFlags::CENTERED;
    let window = shim.create_window("centered", 5, 5, 300, 200, flags).unwrap();

    let state = shim.window(window).unwrap();
    assert_eq!(state.geometry(), Geometry::new(810, 440, 300, 200));
    assert_eq!(state.restore(), state.geometry());
    assert_eq!(shim.active_window(), Some(window));
}

#[test]
fn test_fullscreen_takes_precedence() {
    let mut shim = shim();
    let flags = WindowFlags::SHOWN | WindowFlags::FULLSCREEN | WindowFlags::CENTERED | WindowFlags::MAXIMIZED;
    let window = shim.create_window("fs", 10, 20, 300, 200, flags).unwrap();

    let state = shim.window(window).unwrap();
    assert!(state.is_fullscreen());
    assert_eq!(state.geometry(), Geometry::new(0, 0, 1920, 1080));
    assert_eq!(state.restore(), Geometry::new(10, 20, 300, 200));
}

#[test]
fn test_destroy_null_handle() {
    let mut shim = shim();
    let window = shim.create_window("w", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();

    shim.destroy_window(WindowHandle::default());
    assert_eq!(shim.active_window(), Some(window));
    assert_eq!(shim.errors().count(ErrorKind::Window), 1);
    assert!(!shim.error().is_empty());
}

#[test]
fn test_events_arrive_in_order() {
    let mut shim = shim();
    shim.create_window("w", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();

    let backend = shim.backend_mut();
    backend.push_notification(Notification::Focused(true));
    backend.push_notification(Notification::Resized { w: 640, h: 480 });
    backend.push_notification(Notification::Moved { x: 7, y: 9 });
    backend.push_notification(Notification::Refresh);

    let types: Vec<EventType> = drain(&mut shim).iter().map(Event::event_type).collect();
    assert_eq!(
        types,
        [
            EventType::WindowFocusGained,
            EventType::WindowResized,
            EventType::WindowMoved,
            EventType::WindowExposed,
        ]
    );
}

#[test]
fn test_toggle_round_trip_restores_geometry() {
    let mut shim = shim_on(MockBackend::new().echo_transitions(true));
    let window = shim.create_window("w", 40, 30, 640, 480, WindowFlags::SHOWN).unwrap();
    let before = shim.window(window).unwrap().geometry();

    shim.toggle_fullscreen(window);
    let state = shim.window(window).unwrap();
    assert!(state.is_fullscreen());
    assert_eq!(state.restore(), before);

    let events = drain(&mut shim);
    let Some(Event::WindowResized(resize)) = events.first() else {
        panic!("expected a resize first, got {events:?}");
    };
    assert_eq!((resize.w, resize.h), (1920, 1080));
    assert!(resize.is_fullscreen);

    shim.toggle_fullscreen(window);
    let state = shim.window(window).unwrap();
    assert!(!state.is_fullscreen());
    assert!(!state.is_transitioning());
    assert_eq!(state.geometry(), before);
    assert_eq!(shim.errors().len(), 0);
}

#[test]
fn test_drop_with_failed_copy() {
    let mut shim = shim();
    shim.set_allocator(Box::new(FailingCopies { calls: 0, failing: vec![1] }));
    shim.create_window("w", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();

    let paths = ["/tmp/a.txt", "/tmp/b.txt", "/tmp/c.txt"].map(String::from).to_vec();
    shim.backend_mut().push_notification(Notification::Dropped(paths));

    let mut event = Event::None;
    assert!(shim.poll_event(&mut event));
    let drop = event.drop_event().unwrap();
    assert_eq!(drop.count(), 3);
    assert_eq!(drop.paths().collect::<Vec<_>>(), ["/tmp/a.txt", "/tmp/c.txt"]);
    assert_eq!(shim.errors().count(ErrorKind::Generic), 1);

    // the paths are released by the next poll
    assert!(!shim.poll_event(&mut event));
    assert!(event.drop_event().map_or(true, |drop| drop.paths().next().is_none()));
}

#[test]
fn test_modifier_sides() {
    let mut shim = shim();
    shim.create_window("w", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();

    let backend = shim.backend_mut();
    backend.push_notification(Notification::Key {
        key: 344,
        action: KeyAction::Press,
        mods: NativeModifiers::SHIFT,
    });
    backend.push_notification(Notification::Key {
        key: 65,
        action: KeyAction::Press,
        mods: NativeModifiers::SHIFT,
    });

    let events = drain(&mut shim);
    let Some(key) = events.get(1).and_then(Event::key) else {
        panic!("expected two key events, got {events:?}");
    };
    assert_eq!(key.keycode, Keycode::A);
    assert_eq!(key.mods, Modifiers::RSHIFT);
}

#[test]
fn test_close_then_quit_and_reinit() {
    let mut shim = shim();
    let window = shim.create_window("w", 0, 0, 300, 200, WindowFlags::SHOWN).unwrap();
    shim.backend_mut().push_notification(Notification::CloseRequested);

    let events = drain(&mut shim);
    assert_eq!(events, [Event::Quit]);
    assert!(shim.window(window).is_some());

    shim.quit();
    assert!(shim.window(window).is_none());
    shim.init(InitFlags::VIDEO).unwrap();
    assert!(shim.create_window("again", 0, 0, 300, 200, WindowFlags::SHOWN).is_some());
}

#[test]
fn test_config_from_toml() {
    let path = std::env::temp_dir().join(format!("winshim-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "event_queue_capacity = 64\n\n[gl]\nmajor_version = 4\nminor_version = 1\n",
    )
    .unwrap();

    let config = ShimConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.event_queue_capacity, 64);
    assert_eq!((config.gl.major_version, config.gl.minor_version), (4, 1));
    assert_eq!(config.gl.depth_bits, 24);

    let shim = Shim::with_backend(MockBackend::new(), config.clone());
    assert_eq!(shim.config(), &config);
}
