//! Owned path lists for drop events

use crate::{
    alloc::Allocator,
    error::{ErrorKind, ErrorTrace},
};

/// Payload of a drop event
///
/// `count` is the number of paths the native layer reported. It is an upper
/// bound: slots whose copy failed stay empty, and the list itself may be
/// empty when it could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropEvent {
    paths: Vec<Option<String>>,
    count: usize,
}

impl DropEvent {
    /// Build a payload from already owned paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<Option<String>> = paths.into_iter().map(|p| Some(p.into())).collect();
        let count = paths.len();
        Self { paths, count }
    }

    /// Number of paths reported by the native layer
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Paths that were copied successfully
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().filter_map(Option::as_deref)
    }

    /// Every slot, including the empty ones
    pub fn slots(&self) -> &[Option<String>] {
        &self.paths
    }

    /// Release every path and the list itself
    pub fn clear(&mut self) {
        self.paths = Vec::new();
        self.count = 0;
    }
}

/// Copy call-scoped native paths into an owned [`DropEvent`]
///
/// Native path strings only live for the duration of the notification, so
/// they are copied through `allocator`. A failed copy records a generic error
/// and leaves that slot empty; the remaining paths are still copied. An empty
/// input or a failed list allocation records a generic error and yields an
/// empty list that still carries the native count.
pub fn copy_drop_paths<S: AsRef<str>>(
    native: &[S],
    allocator: &mut dyn Allocator,
    errors: &mut ErrorTrace,
) -> DropEvent {
    let count = native.len();
    if native.is_empty() {
        errors.append(ErrorKind::Generic, "Drop notification carried no paths");
        return DropEvent { paths: Vec::new(), count };
    }

    let mut paths = Vec::new();
    if let Err(e) = allocator.reserve_paths(&mut paths, count) {
        errors.append(ErrorKind::Generic, &format!("Failed to allocate drop path list: {e}"));
        return DropEvent { paths: Vec::new(), count };
    }

    for (index, path) in native.iter().enumerate() {
        match allocator.copy_str(path.as_ref()) {
            Ok(copy) => paths.push(Some(copy)),
            Err(e) => {
                errors.append(ErrorKind::Generic, &format!("Failed to copy dropped path {index}: {e}"));
                paths.push(None);
            }
        }
    }

    log::debug!("Copied {} of {count} dropped paths", paths.iter().flatten().count());
    DropEvent { paths, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{testing::FlakyAllocator, SystemAllocator};

    #[test]
    fn test_copy_all_paths() {
        let mut errors = ErrorTrace::new();
        let drop = copy_drop_paths(&["/a", "/b"], &mut SystemAllocator, &mut errors);

        assert_eq!(drop.count(), 2);
        assert_eq!(drop.paths().collect::<Vec<_>>(), ["/a", "/b"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_failed_copy_leaves_empty_slot() {
        let mut errors = ErrorTrace::new();
        let mut alloc = FlakyAllocator::failing_copy(1);
        let drop = copy_drop_paths(&["/x/one", "/x/two", "/x/three"], &mut alloc, &mut errors);

        assert_eq!(drop.count(), 3);
        assert_eq!(drop.paths().count(), 2);
        assert_eq!(drop.slots()[1], None);
        assert_eq!(drop.paths().collect::<Vec<_>>(), ["/x/one", "/x/three"]);
        assert_eq!(errors.count(ErrorKind::Generic), 1);
    }

    #[test]
    fn test_empty_native_list() {
        let mut errors = ErrorTrace::new();
        let native: [&str; 0] = [];
        let drop = copy_drop_paths(&native, &mut SystemAllocator, &mut errors);

        assert_eq!(drop.count(), 0);
        assert!(drop.slots().is_empty());
        assert_eq!(errors.count(ErrorKind::Generic), 1);
    }

    #[test]
    fn test_failed_list_allocation() {
        let mut errors = ErrorTrace::new();
        let mut alloc = FlakyAllocator { refuse_paths: true, ..FlakyAllocator::default() };
        let drop = copy_drop_paths(&["/a", "/b"], &mut alloc, &mut errors);

        assert_eq!(drop.count(), 2);
        assert!(drop.slots().is_empty());
        assert_eq!(errors.count(ErrorKind::Generic), 1);
        assert_eq!(alloc.copies, 0);
    }

    #[test]
    fn test_clear() {
        let mut drop = DropEvent::from_paths(["/a"]);
        drop.clear();
        assert_eq!(drop, DropEvent::default());
    }
}
