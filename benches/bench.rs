use std::time::{Duration, Instant};
use synched_scan::{BarrierMode, Element, ScanConfig, ScanEngine, prefix_sum_sequential};

// Benchmark configuration
const ARRAY_SIZES: [usize; 3] = [10_000, 100_000, 1_000_000];
const WORKER_COUNTS: [usize; 4] = [1, 2, 4, 8];
const NUM_ROUNDS: usize = 5;

fn generate_input(len: usize) -> Vec<Element> {
    // Repeating ramp from -48 to 48
    (0..len).map(|i| (i % 97) as Element - 48).collect()
}

fn time_it(mut f: impl FnMut()) -> Duration {
    let start = Instant::now();
    for _ in 0..NUM_ROUNDS {
        f();
    }
    start.elapsed() / NUM_ROUNDS as u32
}

fn main() {
    println!("SynchedScan Benchmark Results");
    println!("=============================");
    println!("Rounds per measurement: {}", NUM_ROUNDS);

    for len in ARRAY_SIZES {
        let input = generate_input(len);
        let expected = prefix_sum_sequential(&input);

        let sequential = time_it(|| {
            let _ = prefix_sum_sequential(&input);
        });
        println!("\nN = {len}");
        println!("  sequential: {:?}", sequential);

        for workers in WORKER_COUNTS {
            for mode in [BarrierMode::Ordered, BarrierMode::Unordered] {
                let engine = ScanEngine::new(
                    ScanConfig::default()
                        .with_workers(workers)
                        .with_barrier_mode(mode),
                );

                let elapsed = time_it(|| {
                    let output = engine.run(&input).unwrap();
                    assert_eq!(output.values, expected);
                });
                println!("  {workers} workers, {:<9}: {:?}", format!("{mode:?}"), elapsed);
            }
        }
    }

    println!("\nBenchmark completed successfully!");
}
