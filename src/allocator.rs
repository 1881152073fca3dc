// sixela::allocator
//
// TOC
// - trait SixelAllocator
// - struct DefaultAllocator
// - type SharedAllocator

use crate::{SixelError, SixelResult};
use std::sync::Arc;

/// A pluggable allocation seam for buffers the codec produces (palettes,
/// index streams, decoded surfaces).
///
/// # Adaptation
/// - Derived from `sixel_allocator` in the `libsixel` C library (four raw
///   function pointers: `malloc`/`calloc`/`realloc`/`free`), expressed as a
///   trait object instead since Rust has no need for a C-style vtable.
/// `Arc<dyn SixelAllocator>` gives the refcounting that library's
/// `sixel_allocator_ref`/`unref` provided manually.
pub trait SixelAllocator: core::fmt::Debug + Send + Sync {
    /// Allocates a zeroed buffer of `len` bytes, or `None` on failure.
    fn alloc(&self, len: usize) -> Option<Vec<u8>>;

    /// Grows or shrinks `buf` to `new_len`, zero-extending on growth.
    fn realloc(&self, buf: &mut Vec<u8>, new_len: usize) -> bool {
        if new_len > buf.capacity() && self.alloc(new_len).is_none() {
            return false;
        }
        buf.resize(new_len, 0);
        true
    }
}

/// Allocator backed directly by the global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl SixelAllocator for DefaultAllocator {
    fn alloc(&self, len: usize) -> Option<Vec<u8>> {
        Some(vec![0u8; len])
    }
}

/// Shared, reference-counted handle to a [`SixelAllocator`].
pub type SharedAllocator = Arc<dyn SixelAllocator>;

/// Builds the default, unbounded allocator handle.
#[must_use]
pub fn default_allocator() -> SharedAllocator {
    Arc::new(DefaultAllocator)
}

/// A [`SixelAllocator`] that fails once a fixed byte budget is exhausted,
/// used in tests to exercise `BadAllocation` error paths.
#[derive(Debug)]
pub struct CountingAllocator {
    budget: core::sync::atomic::AtomicUsize,
}

impl CountingAllocator {
    /// Builds a counting allocator with `budget` bytes available in total.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self { budget: core::sync::atomic::AtomicUsize::new(budget) }
    }
}

impl SixelAllocator for CountingAllocator {
    fn alloc(&self, len: usize) -> Option<Vec<u8>> {
        use core::sync::atomic::Ordering;
        let mut current = self.budget.load(Ordering::Relaxed);
        loop {
            if len > current {
                return None;
            }
            match self.budget.compare_exchange(current, current - len, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return Some(vec![0u8; len]),
                Err(observed) => current = observed,
            }
        }
    }
}

/// Checks `len` is representable and nonzero, mapping failures onto
/// [`SixelError::BadAllocation`]/[`SixelError::BadIntegerOverflow`].
pub fn checked_alloc(allocator: &SharedAllocator, len: usize) -> SixelResult<Vec<u8>> {
    if len == 0 {
        return Err(SixelError::BadIntegerOverflow);
    }
    allocator.alloc(len).ok_or(SixelError::BadAllocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocator_zeroes_memory() {
        let a = default_allocator();
        let buf = a.alloc(16).unwrap();
        assert_eq!(buf, vec![0u8; 16]);
    }

    #[test]
    fn counting_allocator_fails_past_budget() {
        let a = CountingAllocator::new(10);
        assert!(a.alloc(6).is_some());
        assert!(a.alloc(6).is_none());
    }

    #[test]
    fn checked_alloc_rejects_zero_length() {
        let a: SharedAllocator = default_allocator();
        assert!(matches!(checked_alloc(&a, 0), Err(SixelError::BadIntegerOverflow)));
    }
}
