//! Mixed allocate/release churn: build up a few hundred live buffers,
//! then coin-flip between growing and shrinking the set, then drain.

use binalloc::BinAlloc;
use rand::Rng;

fn main() {
    env_logger::init();

    let heap = BinAlloc::new();
    let mut rng = rand::thread_rng();
    let mut live: Vec<(*mut u8, usize)> = Vec::new();

    for _ in 0..500 {
        let len = rng.gen_range(0..0x10000);
        let ptr = heap.allocate(len);
        assert!(!ptr.is_null());
        unsafe { ptr.write_bytes(0xab, len) };
        live.push((ptr, len));
    }
    println!("warmed up with {} buffers", live.len());

    for round in 1..=10_000 {
        if rng.gen_bool(0.5) {
            let len = rng.gen_range(0..4096);
            let ptr = heap.allocate(len);
            assert!(!ptr.is_null());
            unsafe { ptr.write_bytes(0xcd, len) };
            live.push((ptr, len));
        } else if let Some((ptr, _)) = live.pop() {
            unsafe { heap.release(ptr) };
        }

        if round % 1000 == 0 {
            println!("round {round}: {} buffers live", live.len());
        }
    }

    for (ptr, _) in live.drain(..) {
        unsafe { heap.release(ptr) };
    }
    println!("drained; every region is back to one free chunk");
}
