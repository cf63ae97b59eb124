#![cfg(loom)]

use loom::sync::Arc;
use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::thread;
use synched_scan::{BarrierMode, CountingBarrier};

const PARTIES: usize = 2;
const ROUNDS: usize = 2;

fn rendezvous(mode: BarrierMode) {
    loom::model(move || {
        let barrier = Arc::new(CountingBarrier::new(PARTIES, mode));
        // one slot per worker, written before the barrier and read by the peer after it
        let slots: Arc<Vec<AtomicUsize>> =
            Arc::new((0..PARTIES).map(|_| AtomicUsize::new(0)).collect());

        let handles: Vec<_> = (0..PARTIES)
            .map(|worker| {
                let barrier = barrier.clone();
                let slots = slots.clone();
                thread::spawn(move || {
                    for round in 0..ROUNDS {
                        slots[worker].store(round + 1, Ordering::Relaxed);
                        barrier.synchronize(worker, round).unwrap();

                        let peer = (worker + 1) % PARTIES;
                        assert!(slots[peer].load(Ordering::Relaxed) >= round + 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(barrier.counter(), PARTIES * ROUNDS);
    });
}

#[test]
fn loom_unordered_barrier_publishes_writes() {
    rendezvous(BarrierMode::Unordered);
}

#[test]
fn loom_ordered_barrier_publishes_writes() {
    rendezvous(BarrierMode::Ordered);
}
