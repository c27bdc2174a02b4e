//! Triplet Scan Benchmarking Tool
//!
//! This binary measures the throughput of the triplet scanner on large text
//! files, like book dumps or Wikipedia abstracts. It's designed to give
//! realistic numbers for production-like workloads and to compare the
//! sequential scan against the chunked parallel scan.
//!
//! ## What It Benchmarks
//!
//! 1. **Sequential**: One whole-input scan on the calling thread
//! 2. **Parallel**: Chunked scan across scoped workers plus the table merge
//!
//! ## Usage
//!
//! ```bash
//! # Benchmark the sequential scan only
//! ./target/release/triplet_bench /path/to/corpus.txt sequential
//!
//! # Benchmark the parallel scan only
//! ./target/release/triplet_bench /path/to/corpus.txt parallel
//!
//! # Run both
//! ./target/release/triplet_bench /path/to/corpus.txt all
//!
//! # Override the processor-usage coefficient (default 0.6)
//! ./target/release/triplet_bench /path/to/corpus.txt parallel 0.3
//! ```
//!
//! ## Output
//!
//! The benchmark prints:
//! - **Elapsed time**: How long the scan took
//! - **Throughput**: GiB/second processed
//! - **Triplets**: Total triplet occurrences tallied
//! - **Distinct**: Number of distinct triplets in the table
//!
//! ## Tips for Accurate Results
//!
//! - Run with `--release` flag (this binary should be built in release mode)
//! - Use a large input file (100MB+) for stable measurements
//! - Disable turbo boost and CPU frequency scaling for consistent results

use std::env;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use triad_core::chunk::{chunk_length, chunk_spans};
use triad_core::scan::{merge_into, scan_slice};
use triad_core::{ExtractConfig, FreqTable};

const WARMUP_RUNS: usize = 1;
const MEASURE_RUNS: usize = 5;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: triplet_bench <path> [sequential|parallel|all] [coefficient]");
        std::process::exit(1);
    }

    let path = &args[1];
    let mode = args.get(2).map(String::as_str).unwrap_or("all");

    let coefficient = match args.get(3) {
        Some(raw) => raw.parse::<f32>().expect("coefficient must be a number"),
        None => ExtractConfig::DEFAULT_COEFFICIENT,
    };

    println!("Loading file...");
    let bytes = fs::read(path)?;

    println!("File size:   {}", fmt_bytes(bytes.len() as u64));
    println!("Coefficient: {}\n", coefficient);

    match mode {
        "sequential" => bench_sequential(&bytes),
        "parallel" => bench_parallel(&bytes, coefficient),
        _ => {
            bench_sequential(&bytes);
            bench_parallel(&bytes, coefficient);
        }
    }

    Ok(())
}

fn bench_sequential(bytes: &[u8]) {
    println!("=== Sequential ===");

    warmup(|| {
        let mut table = FreqTable::default();
        scan_slice(bytes, &mut table);
        std::hint::black_box(&table);
    });

    let mut result = FreqTable::default();
    let elapsed = measure(|| {
        let mut table = FreqTable::default();
        scan_slice(bytes, &mut table);
        result = table;
    });

    print_perf("Sequential", bytes.len(), elapsed, &result);
}

fn bench_parallel(bytes: &[u8], coefficient: f32) {
    let workers = num_cpus::get().max(1);
    let chunk_len = chunk_length(bytes.len(), workers, coefficient);
    let spans = chunk_spans(bytes.len(), chunk_len);

    println!("=== Parallel ({} workers, {} chunks) ===", workers, spans.len());

    warmup(|| {
        std::hint::black_box(scan_chunked(bytes, &spans));
    });

    let mut result = FreqTable::default();
    let elapsed = measure(|| {
        result = scan_chunked(bytes, &spans);
    });

    print_perf("Parallel", bytes.len(), elapsed, &result);
}

fn scan_chunked(bytes: &[u8], spans: &[std::ops::Range<usize>]) -> FreqTable {
    let partials = thread::scope(|scope| {
        let handles: Vec<_> = spans
            .iter()
            .map(|span| {
                let slice = &bytes[span.clone()];
                scope.spawn(move || {
                    let mut table = FreqTable::default();
                    scan_slice(slice, &mut table);
                    table
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("scan worker panicked"))
            .collect::<Vec<_>>()
    });

    let mut merged = FreqTable::default();
    for partial in partials {
        merge_into(&mut merged, partial);
    }
    merged
}

fn warmup<F: FnMut()>(mut f: F) {
    for _ in 0..WARMUP_RUNS {
        f();
    }
}

fn measure<F: FnMut()>(mut f: F) -> Duration {
    let mut total = Duration::ZERO;

    for _ in 0..MEASURE_RUNS {
        let start = Instant::now();
        f();
        total += start.elapsed();
    }

    total / MEASURE_RUNS as u32
}

fn print_perf(label: &str, input_bytes: usize, elapsed: Duration, table: &FreqTable) {
    let secs = elapsed.as_secs_f64();
    let gib = input_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    let total: u64 = table.values().sum();

    println!("--------------------------------");
    println!("Mode        : {}", label);
    println!("Elapsed     : {:.3} s", secs);
    println!("Throughput  : {:.3} GiB/s", gib / secs);
    println!("Triplets    : {}", fmt_count(total));
    println!("Distinct    : {}", fmt_count(table.len() as u64));
    println!("--------------------------------\n");
}

fn fmt_bytes(b: u64) -> String {
    if b >= 1024 * 1024 * 1024 {
        format!("{:.2} GiB", b as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if b >= 1024 * 1024 {
        format!("{:.2} MiB", b as f64 / (1024.0 * 1024.0))
    } else if b >= 1024 {
        format!("{:.2} KiB", b as f64 / 1024.0)
    } else {
        format!("{} B", b)
    }
}

fn fmt_count(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);

    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
