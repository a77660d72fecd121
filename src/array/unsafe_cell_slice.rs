//! An unsafe cell slice.

use std::cell::UnsafeCell;

/// A slice that can be written from multiple threads at once.
///
/// It is the responsibility of the caller to ensure that concurrent writers
/// touch disjoint elements.
#[derive(Copy, Clone)]
pub struct UnsafeCellSlice<'a, T>(&'a [UnsafeCell<T>]);

unsafe impl<T: Send + Sync> Send for UnsafeCellSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for UnsafeCellSlice<'_, T> {}

impl<'a, T: Copy> UnsafeCellSlice<'a, T> {
    /// Create a new [`UnsafeCellSlice`].
    #[must_use]
    pub fn new(slice: &'a mut [T]) -> Self {
        let ptr = std::ptr::from_mut::<[T]>(slice) as *const [UnsafeCell<T>];
        Self(unsafe { &*ptr })
    }

    /// Get a mutable reference to the underlying slice.
    ///
    /// # Safety
    /// This can be called multiple times, creating multiple mutable
    /// references to the same data. It is the responsibility of the caller
    /// not to write to the same slice element from more than one thread.
    #[must_use]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get(&self) -> &mut [T] {
        let ptr = self.0[0].get();
        std::slice::from_raw_parts_mut(ptr, self.0.len())
    }

    /// Get the length of the slice.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the slice has a length of 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
