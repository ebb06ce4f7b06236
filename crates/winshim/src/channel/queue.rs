//! FIFO event queue for callback-driven backends

use std::collections::VecDeque;

use crate::{
    alloc::Allocator,
    error::{ErrorKind, ErrorTrace},
    event::Event,
};

/// Growable FIFO of translated events
///
/// Filled while native notifications are dispatched and drained one event
/// per poll.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// Create an empty queue with room for `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `event`
    ///
    /// Growth goes through `allocator`. If it fails the event is dropped
    /// (its paths released) and a generic error is recorded.
    pub fn push(&mut self, mut event: Event, allocator: &mut dyn Allocator, errors: &mut ErrorTrace) -> bool {
        if self.events.len() == self.events.capacity() {
            let additional = self.events.len().max(1);
            if let Err(e) = allocator.reserve_events(&mut self.events, additional) {
                errors.append(ErrorKind::Generic, &format!("Failed to grow event queue: {e}"));
                event.clear_drop_paths();
                return false;
            }
        }
        self.events.push_back(event);
        true
    }

    /// Remove the oldest event
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every queued event, releasing drop paths
    pub fn drain_and_release(&mut self) -> usize {
        let count = self.events.len();
        for mut event in self.events.drain(..) {
            event.clear_drop_paths();
        }
        self.events = VecDeque::new();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alloc::{testing::FlakyAllocator, SystemAllocator},
        event::{DropEvent, EventType},
    };

    #[test]
    fn test_fifo_order() {
        let mut queue = EventQueue::with_capacity(1);
        let mut errors = ErrorTrace::new();
        for tag in [EventType::WindowFocusGained, EventType::WindowExposed, EventType::Quit] {
            assert!(queue.push(Event::new(tag), &mut SystemAllocator, &mut errors));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().map(|e| e.event_type()), Some(EventType::WindowFocusGained));
        assert_eq!(queue.pop().map(|e| e.event_type()), Some(EventType::WindowExposed));
        assert_eq!(queue.pop().map(|e| e.event_type()), Some(EventType::Quit));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_growth_failure_drops_event() {
        let mut queue = EventQueue::default();
        let mut errors = ErrorTrace::new();
        let mut alloc = FlakyAllocator { refuse_events: true, ..FlakyAllocator::default() };

        let pushed = queue.push(Event::Drop(DropEvent::from_paths(["/a"])), &mut alloc, &mut errors);
        assert!(!pushed);
        assert!(queue.is_empty());
        assert_eq!(errors.count(ErrorKind::Generic), 1);
    }

    #[test]
    fn test_drain_and_release() {
        let mut queue = EventQueue::with_capacity(4);
        let mut errors = ErrorTrace::new();
        queue.push(Event::Drop(DropEvent::from_paths(["/a", "/b"])), &mut SystemAllocator, &mut errors);
        queue.push(Event::Quit, &mut SystemAllocator, &mut errors);

        assert_eq!(queue.drain_and_release(), 2);
        assert!(queue.is_empty());
    }
}
