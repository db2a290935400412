//! The engine state and the two algorithms that drive everything else.
//!
//! Allocation: round the request, search the matching bin, then any
//! higher bin, then map a fresh region; split whatever was found and
//! hand out its payload. Release: recover the chunk, flag it free,
//! coalesce with free neighbors, re-bin the result.

use std::mem;
use std::ptr::{self, NonNull};

use crate::bins::BinRegistry;
use crate::boundary;
use crate::chunk::{Chunk, CHUNK_OVERHEAD, MIN_CHUNK_SIZE, WORD};
use crate::kernel::{self, Os, PlatformMemory};

/// The allocator's working state: the bin registry, housed in storage
/// carved off the data segment on first use. There is no teardown; the
/// state lives until the process exits.
pub(crate) struct Engine {
    bins: BinRegistry,
}

impl Engine {
    /// Acquires and initializes engine state. `None` means the data
    /// segment could not be extended; nothing is committed and a later
    /// call may try again.
    pub(crate) unsafe fn bootstrap() -> Option<NonNull<Engine>> {
        unsafe {
            let Some(raw) = Os::grow_break(mem::size_of::<Engine>()) else {
                log::error!("data segment extension for the engine state failed");
                return None;
            };

            let engine = raw.cast::<Engine>();
            BinRegistry::init(ptr::addr_of_mut!((*engine.as_ptr()).bins));

            Some(engine)
        }
    }

    /// Produces at least `len` writable bytes, or null when the OS turns
    /// the engine down.
    pub(crate) unsafe fn allocate(&mut self, len: usize) -> *mut u8 {
        let Some(need) = chunk_size_for(len) else {
            return ptr::null_mut();
        };

        unsafe {
            let bin = self.bins.alloc_bin(need);

            let mut chunk = self.bins.take_fit(bin, need);
            if chunk.is_none() {
                chunk = self.bins.take_from_higher(bin);
            }
            if chunk.is_none() {
                chunk = kernel::map_chunk(need);
            }

            match chunk {
                Some(chunk) => {
                    let chunk = boundary::split(chunk, need, &mut self.bins);
                    Chunk::payload(chunk)
                }
                None => ptr::null_mut(),
            }
        }
    }

    /// Takes a previously allocated payload back.
    ///
    /// **SAFETY**: `payload` must come from [`Engine::allocate`] on this
    /// engine and must not have been released already.
    pub(crate) unsafe fn release(&mut self, payload: *mut u8) {
        unsafe {
            let chunk = Chunk::from_payload(payload);
            boundary::mark_free(chunk);
            let chunk = boundary::coalesce(chunk, &mut self.bins);
            self.bins.insert(chunk);
        }
    }
}

/// Total chunk size a request for `len` payload bytes demands: the
/// payload rounded to a word multiple, plus the three framing words,
/// never below the minimum chunk. `None` when the arithmetic leaves
/// 64 bits.
fn chunk_size_for(len: usize) -> Option<u64> {
    let word = WORD as u64;
    let rounded = (len as u64).checked_add(word - 1)? & !(word - 1);
    let need = rounded.checked_add(CHUNK_OVERHEAD)?;
    Some(need.max(MIN_CHUNK_SIZE))
}
