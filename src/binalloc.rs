//! The public face of the allocator.

use std::cell::Cell;
use std::ptr::{self, NonNull};

use crate::engine::Engine;

/// A handle to a heap.
///
/// Construction is free; the engine behind the handle is acquired from
/// the OS on the first allocation and lives until the process exits.
/// `new` is `const`, so a handle can sit in a `static` and serve a whole
/// program.
///
/// The handle is strictly single-threaded (`!Sync` by construction);
/// moving pointers between threads or sharing a handle across them is
/// not supported in any form.
pub struct BinAlloc {
    engine: Cell<Option<NonNull<Engine>>>,
}

impl BinAlloc {
    /// A handle with no engine yet.
    pub const fn new() -> Self {
        Self {
            engine: Cell::new(None),
        }
    }

    /// Allocates at least `len` writable bytes, aligned to 8, with
    /// uninitialized contents. Returns null if the OS refuses memory,
    /// in which case nothing is committed and the call may be retried.
    ///
    /// A `len` of zero still produces a distinct, usable buffer.
    pub fn allocate(&self, len: usize) -> *mut u8 {
        match self.engine() {
            Some(mut engine) => unsafe { engine.as_mut().allocate(len) },
            None => ptr::null_mut(),
        }
    }

    /// Releases a buffer back to the engine. The memory stays with the
    /// engine for reuse; it is never returned to the OS.
    ///
    /// # Safety
    ///
    /// `payload` must have been returned by [`BinAlloc::allocate`] on
    /// this same handle, must not be null, and must not have been
    /// released before.
    pub unsafe fn release(&self, payload: *mut u8) {
        if let Some(mut engine) = self.engine.get() {
            unsafe { engine.as_mut().release(payload) };
        }
    }

    /// The engine, bootstrapping it on first use. A failed bootstrap
    /// leaves the handle unset so a later call can try again.
    fn engine(&self) -> Option<NonNull<Engine>> {
        if let Some(engine) = self.engine.get() {
            return Some(engine);
        }

        let engine = unsafe { Engine::bootstrap() }?;
        self.engine.set(Some(engine));
        Some(engine)
    }
}

impl Default for BinAlloc {
    fn default() -> Self {
        Self::new()
    }
}
