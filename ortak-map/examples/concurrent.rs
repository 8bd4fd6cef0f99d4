//! Example demonstrating concurrent views over one shared map.
//!
//! Each thread adopts the map's transferable state and gets its own
//! view; the region-resident lock coordinates them.

use std::thread;
use std::time::Instant;

use ortak_map::{MapOptions, ShareableMap};

fn main() {
    println!("=== Shared-Memory Map Demo ===\n");

    let map = ShareableMap::new(MapOptions::default()).unwrap();

    println!("Benchmarking concurrent inserts...");
    let start = Instant::now();
    let mut handles = Vec::new();

    // Spawn 4 writers, each owning a view over the same regions.
    for thread_id in 0..4 {
        let state = map.to_transferable_state();
        handles.push(thread::spawn(move || {
            let view =
                ShareableMap::from_transferable_state(state, MapOptions::default()).unwrap();
            for i in 0..10_000 {
                let key = format!("t{}-{}", thread_id, i);
                view.set(key.as_str(), i).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Inserted 40,000 entries from 4 threads in {:?} ({:.0} ops/sec)",
        duration,
        40_000.0 / duration.as_secs_f64()
    );
    println!("Map contains {} entries\n", map.len().unwrap());

    println!("Benchmarking concurrent reads...");
    let start = Instant::now();
    let mut handles = Vec::new();
    for thread_id in 0..4 {
        let state = map.to_transferable_state();
        handles.push(thread::spawn(move || {
            let view =
                ShareableMap::from_transferable_state(state, MapOptions::default()).unwrap();
            let mut hits = 0;
            for i in 0..10_000 {
                let key = format!("t{}-{}", thread_id, i);
                if view.get(key.as_str()).unwrap().is_some() {
                    hits += 1;
                }
            }
            hits
        }));
    }
    let hits: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let duration = start.elapsed();
    println!(
        "Read back {} entries in {:?} ({:.0} ops/sec)",
        hits,
        duration,
        40_000.0 / duration.as_secs_f64()
    );

    let stats = map.stats().unwrap();
    println!(
        "\n{} entries over {} buckets ({} in use), {} live bytes",
        stats.len, stats.bucket_count, stats.buckets_in_use, stats.used_space
    );
    println!("Example completed successfully!");
}
