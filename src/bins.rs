//! The free-list registry: 46 bins of free chunks, segregated by size
//! class and kept sorted within each bin.
//!
//! Each bin is a doubly-linked list threaded through the payloads of its
//! free chunks and anchored by a sentinel chunk of size zero:
//!
//! ```text
//! bin 0, up to  40 bytes: [sentinel] -> [chunk] -> [chunk] -> x
//! bin 1, up to  48 bytes: [sentinel] -> [chunk] -> x
//! bin 2, up to  56 bytes: [sentinel] -> x
//! ...
//! bin 45, unbounded:      [sentinel] -> [chunk] -> x
//! ```
//!
//! The sentinel is never dispensed; it exists so removal never has to
//! special-case the head of a list. Within a bin, chunks sit in
//! ascending size order, equal sizes in arrival order, so the first fit
//! found while walking a bin is also the smallest.

use std::ptr::{self, NonNull};

use crate::chunk::Chunk;

/// Number of size classes.
pub(crate) const NUM_BINS: usize = 46;

/// Upper size bound of every bin, ascending. The strides widen with the
/// sizes: 8 bytes up to 128, then 16, 32 and 64 up to 1024, then powers
/// of two up to 512 KiB, and a final catch-all bin.
fn bin_bounds() -> [u64; NUM_BINS] {
    let mut bounds = [0u64; NUM_BINS];
    let mut index = 0;

    let mut bound: u64 = 40;
    while bound <= 128 {
        bounds[index] = bound;
        index += 1;
        bound += 8;
    }
    let mut bound: u64 = 144;
    while bound <= 256 {
        bounds[index] = bound;
        index += 1;
        bound += 16;
    }
    let mut bound: u64 = 288;
    while bound <= 512 {
        bounds[index] = bound;
        index += 1;
        bound += 32;
    }
    let mut bound: u64 = 576;
    while bound <= 1024 {
        bounds[index] = bound;
        index += 1;
        bound += 64;
    }
    let mut bound: u64 = 2048;
    while bound <= 524288 {
        bounds[index] = bound;
        index += 1;
        bound *= 2;
    }

    debug_assert_eq!(index, NUM_BINS - 1);
    bounds[index] = u64::MAX;

    bounds
}

/// The bin array plus its bound table. Lives inside the engine state and
/// never moves once initialized; free chunks hold pointers back into the
/// sentinel array.
pub(crate) struct BinRegistry {
    sentinels: [Chunk; NUM_BINS],
    bounds: [u64; NUM_BINS],
}

impl BinRegistry {
    /// Initializes a registry in place inside raw engine storage.
    ///
    /// **SAFETY**: `registry` must point at writable, well-aligned storage
    /// for a `BinRegistry` that never moves afterwards.
    pub(crate) unsafe fn init(registry: *mut BinRegistry) {
        unsafe {
            ptr::addr_of_mut!((*registry).bounds).write(bin_bounds());

            let sentinels = ptr::addr_of_mut!((*registry).sentinels).cast::<Chunk>();
            for bin in 0..NUM_BINS {
                sentinels.add(bin).write(Chunk::sentinel());
            }
        }
    }

    /// The bin to search for a request of `need` total bytes. Starts at
    /// index 1: a request already carries the chunk overhead and cannot
    /// fall below the bound of bin 0.
    pub(crate) fn alloc_bin(&self, need: u64) -> usize {
        self.scan_bounds(need, 1)
    }

    /// The bin a free chunk of `size` bytes belongs to.
    fn home_bin(&self, size: u64) -> usize {
        self.scan_bounds(size, 0)
    }

    /// Smallest index at or after `start` whose bound covers `size`. The
    /// final bound is `u64::MAX`, so the scan always lands.
    fn scan_bounds(&self, size: u64, start: usize) -> usize {
        let mut bin = start;
        while size > self.bounds[bin] {
            bin += 1;
        }
        bin
    }

    /// Splices `chunk` into its home bin, keeping the bin sorted. A chunk
    /// the size of existing entries goes after them.
    ///
    /// **SAFETY**: `chunk` must be a valid free chunk in no bin.
    pub(crate) unsafe fn insert(&mut self, mut chunk: NonNull<Chunk>) {
        let size = unsafe { chunk.as_ref().size() };
        let bin = self.home_bin(size);

        unsafe {
            let mut prev = NonNull::from(&mut self.sentinels[bin]);
            let mut cursor = prev.as_ref().next_free;

            while let Some(mut current) = cursor {
                if size < current.as_ref().size() {
                    chunk.as_mut().prev_free = Some(prev);
                    chunk.as_mut().next_free = Some(current);
                    prev.as_mut().next_free = Some(chunk);
                    current.as_mut().prev_free = Some(chunk);
                    return;
                }
                prev = current;
                cursor = current.as_ref().next_free;
            }

            // Largest of its bin so far; becomes the tail.
            prev.as_mut().next_free = Some(chunk);
            chunk.as_mut().prev_free = Some(prev);
            chunk.as_mut().next_free = None;
        }
    }

    /// Unlinks `chunk` from its bin and clears its links. The sentinel
    /// guarantees a predecessor, so there is no head case.
    ///
    /// **SAFETY**: `chunk` must currently be linked into one of this
    /// registry's bins.
    pub(crate) unsafe fn remove(&mut self, mut chunk: NonNull<Chunk>) -> NonNull<Chunk> {
        unsafe {
            let mut prev = chunk.as_ref().prev_free.unwrap();
            prev.as_mut().next_free = chunk.as_ref().next_free;

            if let Some(mut next) = chunk.as_ref().next_free {
                next.as_mut().prev_free = Some(prev);
            }

            chunk.as_mut().prev_free = None;
            chunk.as_mut().next_free = None;

            chunk
        }
    }

    /// Walks bin `bin` for the first (hence smallest) chunk of at least
    /// `need` bytes and takes it out of the list.
    pub(crate) unsafe fn take_fit(&mut self, bin: usize, need: u64) -> Option<NonNull<Chunk>> {
        unsafe {
            let mut cursor = self.sentinels[bin].next_free;

            while let Some(current) = cursor {
                if current.as_ref().size() >= need {
                    return Some(self.remove(current));
                }
                cursor = current.as_ref().next_free;
            }

            None
        }
    }

    /// Takes the first chunk of the first non-empty bin above `bin`; in a
    /// sorted bin that is its smallest entry.
    pub(crate) unsafe fn take_from_higher(&mut self, bin: usize) -> Option<NonNull<Chunk>> {
        unsafe {
            for higher in bin + 1..NUM_BINS {
                if let Some(first) = self.sentinels[higher].next_free {
                    return Some(self.remove(first));
                }
            }

            None
        }
    }
}
