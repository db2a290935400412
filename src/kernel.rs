//! The platform layer: everything that talks to the OS.
//!
//! The engine asks the OS for two things only. Fresh heap regions come
//! from an anonymous private mapping; the engine state itself is housed
//! in a one-off extension of the data segment. Neither is ever given
//! back, so there is no unmapping counterpart here.

use std::ptr::NonNull;

use crate::chunk::Chunk;
use crate::utils::align;

/// Virtual memory page size of the machine. This would be a constant if
/// it were knowable at compile time; it is cached on first query.
pub(crate) static mut PAGE_SIZE: usize = 0;

/// Smallest region requested from the OS: 32 pages of 4 KiB.
pub(crate) const REGION_MIN: u64 = 0x20000;

/// Abstraction over the low level memory syscalls, so the engine's view
/// of "give me memory" stays clear of platform APIs.
pub(crate) trait PlatformMemory {
    /// Maps a fresh region of `len` bytes, or `None` if the syscall
    /// fails.
    unsafe fn request_memory(len: usize) -> Option<NonNull<u8>>;

    /// Extends the data segment by `len` bytes and returns its previous
    /// end, or `None` if the syscall fails.
    unsafe fn grow_break(len: usize) -> Option<NonNull<u8>>;

    /// The virtual memory page size in bytes.
    unsafe fn page_size() -> usize;
}

/// The host OS. Only POSIX is supported: the engine state needs `sbrk`.
pub(crate) struct Os;

/// Cached wrapper around [`PlatformMemory::page_size`].
#[inline]
pub(crate) fn page_size() -> usize {
    unsafe {
        if PAGE_SIZE == 0 {
            PAGE_SIZE = Os::page_size();
        }
        PAGE_SIZE
    }
}

#[cfg(unix)]
mod unix {
    use super::{Os, PlatformMemory};

    use libc::{mmap, off_t, size_t};

    use std::os::raw::{c_int, c_void};
    use std::ptr::NonNull;

    impl PlatformMemory for Os {
        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                let addr = mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET);

                match addr {
                    libc::MAP_FAILED => None,
                    addr => Some(NonNull::new_unchecked(addr).cast::<u8>()),
                }
            }
        }

        unsafe fn grow_break(len: usize) -> Option<NonNull<u8>> {
            unsafe {
                let brk = libc::sbrk(len as libc::intptr_t);

                if brk as isize == -1 {
                    None
                } else {
                    NonNull::new(brk.cast::<u8>())
                }
            }
        }

        unsafe fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

/// Maps a region able to hold a chunk of `need` bytes and stamps it as
/// one chunk spanning the whole of it, zero-bounded on both ends. The
/// chunk arrives logically in use and in no bin; the caller decides what
/// to split off and re-bin.
pub(crate) unsafe fn map_chunk(need: u64) -> Option<NonNull<Chunk>> {
    let len = region_len(need);

    unsafe {
        let Some(addr) = Os::request_memory(len as usize) else {
            log::error!("anonymous mapping of {len} bytes failed");
            return None;
        };
        log::debug!("mapped a fresh region of {len} bytes");

        let mut chunk = addr.cast::<Chunk>();
        chunk.as_mut().write_prev_word(0);
        chunk.as_mut().set_size(len);
        Chunk::write_next_word(chunk, 0);

        Some(chunk)
    }
}

/// Region sizing policy: never less than [`REGION_MIN`]; anything larger
/// rounds up to whole pages plus one spare page.
fn region_len(need: u64) -> u64 {
    if need <= REGION_MIN {
        REGION_MIN
    } else {
        let page = page_size();
        (align(need as usize, page) + page) as u64
    }
}
