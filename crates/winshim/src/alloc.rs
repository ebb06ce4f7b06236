//! Allocation seam for queued events and dropped paths
//!
//! Everything the shim stores on behalf of a native notification goes through
//! an [`Allocator`], so that running out of memory turns into "no event" or an
//! empty path slot instead of an abort.

use std::collections::{TryReserveError, VecDeque};

use thiserror::Error;

use crate::event::Event;

/// Allocation failures
#[derive(Error, Debug)]
pub enum AllocError {
    /// The global allocator could not reserve the memory
    #[error("{0}")]
    Reserve(#[from] TryReserveError),

    /// A custom allocator refused the request
    #[error("allocator refused a request of {requested} bytes")]
    Refused {
        /// Size of the rejected request in bytes
        requested: usize,
    },
}

/// Fallible allocation used for event storage
pub trait Allocator {
    /// Copy `source` into a freshly allocated string
    fn copy_str(&mut self, source: &str) -> Result<String, AllocError>;

    /// Make room for `additional` more path slots
    fn reserve_paths(
        &mut self,
        paths: &mut Vec<Option<String>>,
        additional: usize,
    ) -> Result<(), AllocError>;

    /// Make room for `additional` more queued events
    fn reserve_events(
        &mut self,
        queue: &mut VecDeque<Event>,
        additional: usize,
    ) -> Result<(), AllocError>;
}

/// Allocator backed by the global allocator's `try_reserve`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn copy_str(&mut self, source: &str) -> Result<String, AllocError> {
        let mut copy = String::new();
        copy.try_reserve_exact(source.len())?;
        copy.push_str(source);
        Ok(copy)
    }

    fn reserve_paths(
        &mut self,
        paths: &mut Vec<Option<String>>,
        additional: usize,
    ) -> Result<(), AllocError> {
        paths.try_reserve_exact(additional)?;
        Ok(())
    }

    fn reserve_events(
        &mut self,
        queue: &mut VecDeque<Event>,
        additional: usize,
    ) -> Result<(), AllocError> {
        queue.try_reserve(additional)?;
        Ok(())
    }
}
