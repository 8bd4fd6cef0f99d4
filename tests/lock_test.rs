//! Cross-thread discipline of the region-resident read/write lock.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ortak::{OrtakError, Region, RegionRwLock};

const STATE_OFFSET: usize = 12;
const READERS_OFFSET: usize = 20;

fn fixture() -> Arc<Region> {
    Region::alloc(4096, 65_536).unwrap()
}

#[test]
#[cfg_attr(miri, ignore)]
fn writers_are_mutually_exclusive() {
    let region = fixture();
    let mut handles = Vec::new();

    for _ in 0..8 {
        let region = Arc::clone(&region);
        handles.push(thread::spawn(move || {
            let lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
            for _ in 0..1_000 {
                let _guard = lock.write().unwrap();
                // Non-atomic read-modify-write; only mutual exclusion
                // keeps the count exact.
                let n = region.read_u32(0);
                region.write_u32(0, n + 1);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(region.read_u32(0), 8_000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn readers_observe_consistent_pairs() {
    let region = fixture();
    let writer = {
        let region = Arc::clone(&region);
        thread::spawn(move || {
            let lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
            for i in 1..=2_000u32 {
                let _guard = lock.write().unwrap();
                region.write_u32(0, i);
                region.write_u32(4, i.wrapping_mul(31));
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let region = Arc::clone(&region);
        readers.push(thread::spawn(move || {
            let lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
            for _ in 0..2_000 {
                let _guard = lock.read().unwrap();
                let a = region.read_u32(0);
                let b = region.read_u32(4);
                assert_eq!(b, a.wrapping_mul(31), "torn read: {} / {}", a, b);
            }
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn write_acquisition_times_out_against_held_lock() {
    let region = fixture();
    let holder_lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
    let guard = holder_lock.write().unwrap();

    let contender = {
        let region = Arc::clone(&region);
        thread::spawn(move || {
            let lock = RegionRwLock::new(region, STATE_OFFSET, READERS_OFFSET)
                .with_timeout(Duration::from_millis(100));
            lock.write().map(|_| ())
        })
    };

    let err = contender.join().unwrap().unwrap_err();
    assert!(matches!(err, OrtakError::LockTimeout { .. }));
    drop(guard);

    // Once released, acquisition succeeds again.
    let lock = RegionRwLock::new(region, STATE_OFFSET, READERS_OFFSET);
    let _guard = lock.write().unwrap();
}

#[test]
#[cfg_attr(miri, ignore)]
fn blocked_writer_proceeds_after_release() {
    let region = fixture();
    let lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
    let guard = lock.read().unwrap();

    let writer = {
        let region = Arc::clone(&region);
        thread::spawn(move || {
            let lock = RegionRwLock::new(region.clone(), STATE_OFFSET, READERS_OFFSET);
            let _guard = lock.write().unwrap();
            region.write_u32(0, 1);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(region.read_u32(0), 0);
    drop(guard);

    writer.join().unwrap();
    assert_eq!(region.read_u32(0), 1);
}
