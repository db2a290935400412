//! Smallest possible tour of the allocator: take a few buffers,
//! scribble on them, hand them back, watch one come straight back out.

use binalloc::BinAlloc;

fn main() {
    env_logger::init();

    let heap = BinAlloc::new();

    let counter = heap.allocate(std::mem::size_of::<u64>()).cast::<u64>();
    println!("Requested 8 bytes, got {counter:?}");

    unsafe {
        counter.write(0);
        for _ in 0..5 {
            counter.write(counter.read() + 1);
        }
        println!("Counted to {}", counter.read());
    }

    let text = heap.allocate(64);
    println!("Requested 64 bytes, got {text:?}");
    unsafe {
        text.copy_from_nonoverlapping(b"heap testing".as_ptr(), 12);
    }

    unsafe {
        heap.release(counter.cast());
        heap.release(text);
    }

    // The released front of the region is handed out again.
    let reused = heap.allocate(8);
    println!("Requested 8 more bytes, got {reused:?}");
    if reused == counter.cast() {
        println!("Correctly reused the released buffer");
    }
    unsafe { heap.release(reused) };
}
