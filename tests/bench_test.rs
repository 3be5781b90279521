//! Benchmark tests for critical operations
//!
//! Run with: cargo test --release -- --nocapture bench

use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

use snaplink::clock::SystemClock;
use snaplink::database::{MemoryStore, RedbStore};
use snaplink::model::ClickData;
use snaplink::random::ThreadRandom;
use snaplink::{ServiceOptions, UrlService};

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn redb_service(temp_db: &NamedTempFile) -> UrlService {
    let store = RedbStore::open(temp_db.path().to_str().unwrap()).unwrap();
    UrlService::new(
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(ThreadRandom),
        ServiceOptions::default(),
    )
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_create_urls() {
    println!("\n=== Benchmark: Create URLs ===\n");

    let temp_db = NamedTempFile::new().unwrap();
    let service = redb_service(&temp_db);
    benchmark("Create on redb", 500, || {
        service.create("https://example.com/bench", 30, None).unwrap();
    });

    let memory = UrlService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
        Arc::new(ThreadRandom),
        ServiceOptions::default(),
    );
    benchmark("Create in memory", 500, || {
        memory.create("https://example.com/bench", 30, None).unwrap();
    });
}

#[test]
#[ignore]
fn bench_record_clicks() {
    println!("\n=== Benchmark: Record clicks ===\n");

    let temp_db = NamedTempFile::new().unwrap();
    let service = redb_service(&temp_db);
    service
        .create("https://example.com/hot", 60, Some("hotlink"))
        .unwrap();

    benchmark("Record click", 500, || {
        assert!(service.record_click("hotlink", ClickData::default()));
    });
}

#[test]
#[ignore]
fn bench_list_and_stats() {
    println!("\n=== Benchmark: List and stats ===\n");

    let temp_db = NamedTempFile::new().unwrap();
    let service = redb_service(&temp_db);
    for _ in 0..300 {
        service.create("https://example.com/list", 30, None).unwrap();
    }

    benchmark("List all (300 records)", 200, || {
        assert_eq!(service.list_all().len(), 300);
    });
    benchmark("Stats (300 records)", 200, || {
        assert_eq!(service.stats().total_urls, 300);
    });
}
