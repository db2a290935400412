//! Black-box workouts of the public surface. Every test drives its own
//! handle, so each one works against a private engine.

use std::sync::Mutex;

use binalloc::BinAlloc;
use rand::Rng;

// `sbrk` carries no lock of its own; engine bootstraps from concurrent
// test threads must be serialized. The warm-up allocation forces the
// bootstrap while the lock is held and leaves the engine with exactly
// one wholly-free region.
static BOOTSTRAP: Mutex<()> = Mutex::new(());

fn heap() -> BinAlloc {
    let _serial = BOOTSTRAP.lock().unwrap();
    let heap = BinAlloc::new();

    let warmup = heap.allocate(0);
    assert!(!warmup.is_null());
    unsafe { heap.release(warmup) };

    heap
}

#[test]
fn released_buffers_come_straight_back() {
    let heap = heap();

    let first = heap.allocate(1);
    assert!(!first.is_null());
    unsafe { heap.release(first) };

    let second = heap.allocate(1);
    assert_eq!(first, second);
}

#[test]
fn buffers_are_word_aligned_and_disjoint() {
    let heap = heap();

    let mut buffers = Vec::new();
    for len in [0usize, 1, 7, 8, 23, 100, 4096, 70_000] {
        let ptr = heap.allocate(len);
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % 8, 0);
        buffers.push((ptr, len));
    }

    // Filling one buffer to the brim must leave every other intact.
    for (i, &(ptr, len)) in buffers.iter().enumerate() {
        unsafe { ptr.write_bytes(i as u8, len) };
    }
    for (i, &(ptr, len)) in buffers.iter().enumerate() {
        for offset in 0..len {
            assert_eq!(unsafe { *ptr.add(offset) }, i as u8);
        }
    }

    for &(ptr, _) in &buffers {
        unsafe { heap.release(ptr) };
    }
}

#[test]
fn zero_length_requests_yield_usable_buffers() {
    let heap = heap();

    let first = heap.allocate(0);
    let second = heap.allocate(0);
    assert!(!first.is_null());
    assert!(!second.is_null());
    assert_ne!(first, second);

    // The minimum chunk always has 16 bytes behind the pointer.
    unsafe {
        first.write_bytes(0x11, 16);
        second.write_bytes(0x22, 16);
        assert_eq!(*first, 0x11);
        heap.release(first);
        heap.release(second);
    }
}

#[test]
fn repeated_cycles_stay_in_place() {
    let heap = heap();

    let first = heap.allocate(500);
    unsafe { heap.release(first) };

    // Memory under the engine does not creep across identical cycles.
    for _ in 0..100 {
        let ptr = heap.allocate(500);
        assert_eq!(ptr, first);
        unsafe { heap.release(ptr) };
    }
}

#[test]
fn values_survive_a_wide_sweep() {
    let heap = heap();
    let mut rng = rand::thread_rng();

    let mut cells: Vec<(*mut u32, u32)> = (0..100_000)
        .map(|_| {
            let cell = heap.allocate(4).cast::<u32>();
            assert!(!cell.is_null());
            let value = rng.gen();
            unsafe { cell.write(value) };
            (cell, value)
        })
        .collect();

    for &(cell, value) in &cells {
        assert_eq!(unsafe { cell.read() }, value);
    }

    for (cell, _) in cells.drain(..) {
        unsafe { heap.release(cell.cast()) };
    }
}

#[test]
fn a_million_pointers_through_one_buffer() {
    const COUNT: usize = 1_000_000;
    let heap = heap();

    let table = heap.allocate(COUNT * 8).cast::<*mut u8>();
    assert!(!table.is_null());

    unsafe {
        for i in 0..COUNT {
            let cell = heap.allocate(4);
            assert!(!cell.is_null());
            table.add(i).write(cell);
        }

        for i in 0..COUNT {
            heap.release(table.add(i).read());
        }
        heap.release(table.cast());
    }

    // Everything coalesced: a fresh pointer lands where an old one was.
    let again = heap.allocate(4);
    assert!(!again.is_null());
    unsafe { heap.release(again) };
}

#[test]
fn coin_flip_churn_drains_clean() {
    let heap = heap();
    let mut rng = rand::thread_rng();

    let mut live: Vec<(*mut u8, usize)> = Vec::new();
    let mut seen: Vec<*mut u8> = Vec::new();

    for _ in 0..10_000 {
        if rng.gen_bool(0.5) {
            let len = rng.gen_range(0..4096);
            let ptr = heap.allocate(len);
            assert!(!ptr.is_null());
            unsafe { ptr.write_bytes(0xcd, len) };
            live.push((ptr, len));
            seen.push(ptr);
        } else if let Some((ptr, _)) = live.pop() {
            unsafe { heap.release(ptr) };
        }
    }

    for (ptr, _) in live.drain(..) {
        unsafe { heap.release(ptr) };
    }

    // With every region wholly free again, the next allocation carves
    // the front of a region the workload already used.
    let next = heap.allocate(1);
    assert!(seen.contains(&next));
    unsafe { heap.release(next) };
}

#[test]
fn resplit_after_full_coalescing() {
    let heap = heap();

    // 16 bytes round up to the 40-byte minimum chunk.
    let small = heap.allocate(16);
    assert!(!small.is_null());
    unsafe { heap.release(small) };

    // The 56-byte chunk this needs comes out of the same coalesced
    // front, so the addresses coincide.
    let larger = heap.allocate(32);
    assert_eq!(larger, small);
    unsafe { heap.release(larger) };
}

#[test]
fn oversized_requests_get_a_dedicated_region() {
    let heap = heap();

    // Far past the minimum region: forces the page-rounded path.
    let len = 0x20000 + 4096;
    let big = heap.allocate(len);
    assert!(!big.is_null());

    // A fresh region starts page-aligned, and the payload sits 16 bytes
    // into its first chunk.
    assert_eq!(big as usize % 4096, 16);

    unsafe {
        big.write(0xee);
        big.add(len - 1).write(0xff);
        assert_eq!(*big, 0xee);
        assert_eq!(*big.add(len - 1), 0xff);
        heap.release(big);
    }

    // The dedicated region is reused like any other.
    let again = heap.allocate(len);
    assert_eq!(again, big);
    unsafe { heap.release(again) };
}
