//! BinAlloc is a boundary-tag heap allocator for POSIX systems, a
//! `malloc`/`free` pair behind two calls: [`BinAlloc::allocate`] and
//! [`BinAlloc::release`].
//!
//! Memory is managed in *chunks*. Chunks sit side by side inside
//! *regions* obtained from the kernel with
//! [`mmap`](https://man7.org/linux/man-pages/man2/mmap.2.html), and each
//! one spends 24 bytes on three tracking words: the size of the chunk
//! before it in memory, its own size, and the size of the chunk after
//! it. The neighbor words carry the neighbor's in-use flag in their top
//! bit, which is what lets a release discover mergeable neighbors
//! without any global table.
//!
//! An allocated chunk is caller territory past the first 16 bytes:
//!
//! ```text
//! +----------------------+
//! | size of prev chunk   |
//! | + its in-use flag    |
//! +----------------------+
//! | size of this chunk   |
//! +----------------------+ <---- address returned to the caller
//! |                      |
//! |       payload        |
//! |                      |
//! +----------------------+
//! | size of next chunk   |
//! | + its in-use flag    |
//! +----------------------+
//! ```
//!
//! A free chunk keeps the same frame but lends its payload to the
//! engine, which threads two list pointers through it:
//!
//! ```text
//! +----------------------+
//! | size of prev chunk   |
//! +----------------------+
//! | size of this chunk   |
//! +----------------------+
//! | link to prev in bin  |
//! +----------------------+
//! | link to next in bin  |
//! +----------------------+
//! |    unused space      |
//! +----------------------+
//! | size of next chunk   |
//! +----------------------+
//! ```
//!
//! Free chunks wait in 46 *bins* segregated by size class and sorted
//! within each bin, every bin headed by a sentinel so removal never
//! special-cases the head:
//!
//! ```text
//! bin 0, up to  40 bytes: [sentinel] -> [chunk] -> [chunk] -> x
//! bin 1, up to  48 bytes: [sentinel] -> [chunk] -> x
//! ...
//! bin 45, unbounded:      [sentinel] -> x
//! ```
//!
//! Allocation searches the matching bin, then larger ones, then maps a
//! fresh region, splitting whatever it finds and keeping the remainder.
//! Release merges the chunk with any free neighbor and re-bins the
//! result. Regions are never handed back to the OS.
//!
//! The engine is strictly single-threaded; see [`BinAlloc`] for the
//! ownership rules.

mod binalloc;
mod bins;
mod boundary;
mod chunk;
mod engine;
mod kernel;
mod utils;

pub use binalloc::BinAlloc;
