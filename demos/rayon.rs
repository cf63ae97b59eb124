use rayon::prelude::*;
use synched_scan::{BarrierMode, Element, ScanConfig, ScanEngine, prefix_sum_sequential};

// Chunked scan: local sums per chunk in parallel, then offsets from the chunk totals
fn prefix_sum_rayon(input: &[Element], chunks: usize) -> Vec<Element> {
    let chunk_size = input.len().div_ceil(chunks).max(1);

    let local_sums: Vec<Vec<Element>> = input
        .par_chunks(chunk_size)
        .map(prefix_sum_sequential)
        .collect();

    let mut offsets = vec![0 as Element; local_sums.len()];
    for i in 1..offsets.len() {
        let previous_total = local_sums[i - 1].last().copied().unwrap_or(0);
        offsets[i] = offsets[i - 1].wrapping_add(previous_total);
    }

    local_sums
        .into_par_iter()
        .zip(offsets.into_par_iter())
        .flat_map_iter(|(local, offset)| local.into_iter().map(move |v| v.wrapping_add(offset)))
        .collect()
}

fn main() {
    println!("Hillis-Steele barrier scan vs chunked Rayon scan");
    println!("================================================\n");

    // Configuration
    const LEN: usize = 2_000_000;
    const NUM_WORKERS: usize = 4;

    let input: Vec<Element> = (0..LEN).map(|i| (i % 13) as Element - 6).collect();

    println!("Configuration:");
    println!("  Elements: {}", LEN);
    println!("  Workers: {}\n", NUM_WORKERS);

    let start_time = std::time::Instant::now();
    let sequential = prefix_sum_sequential(&input);
    println!("Sequential: {:?}", start_time.elapsed());

    let start_time = std::time::Instant::now();
    let chunked = prefix_sum_rayon(&input, NUM_WORKERS);
    println!("Rayon chunked: {:?}", start_time.elapsed());

    let engine = ScanEngine::new(
        ScanConfig::default()
            .with_workers(NUM_WORKERS)
            .with_barrier_mode(BarrierMode::Unordered),
    );
    let start_time = std::time::Instant::now();
    let output = engine.run(&input).expect("scan failed");
    println!(
        "Barrier scan: {:?} ({} rounds, result on {:?})",
        start_time.elapsed(),
        output.rounds,
        output.result_side
    );

    assert_eq!(chunked, sequential);
    assert_eq!(output.values, sequential);
    println!("\nAll three scans agree.");

    println!("\nPer-round timing of the barrier scan:");
    output.stats.plot();
}
