//! Single-writer / multi-reader lock resident in a shared region.
//!
//! The lock owns no memory of its own: its whole state is two 32-bit
//! atomic words inside the index region (`lock_state` and `read_count`),
//! so every view constructed over the same region pair contends on the
//! same lock. Guards release on drop, which covers panics raised inside
//! user callbacks run under the lock.
//!
//! The lock is not fair: writers can starve under sustained reader load.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::Backoff;

use crate::error::OrtakError;
use crate::futex::{futex_wait, futex_wake_all};
use crate::region::Region;

/// Lock word value: no holder.
pub const UNLOCKED: u32 = 0;
/// Lock word value: one writer holds the lock.
pub const WRITE_LOCKED: u32 = 1;
/// Lock word value: one or more readers hold the lock.
pub const READ_LOCKED: u32 = 2;

/// Default acquisition timeout for both lock sides.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Read/write lock over two atomic words embedded in a region.
///
/// On a process-local region every operation succeeds immediately and
/// touches nothing: a region that cannot be shared has no concurrent
/// observers to coordinate with.
#[derive(Debug)]
pub struct RegionRwLock {
    region: Arc<Region>,
    state_offset: usize,
    readers_offset: usize,
    timeout: Duration,
    enabled: bool,
}

impl RegionRwLock {
    /// Binds a lock to the two 4-aligned words at `state_offset` and
    /// `readers_offset` in `region`.
    pub fn new(region: Arc<Region>, state_offset: usize, readers_offset: usize) -> Self {
        let enabled = region.is_shared();
        RegionRwLock {
            region,
            state_offset,
            readers_offset,
            timeout: DEFAULT_LOCK_TIMEOUT,
            enabled,
        }
    }

    /// Replaces the acquisition timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    fn state(&self) -> &AtomicU32 {
        self.region.atomic_u32(self.state_offset)
    }

    #[inline]
    fn readers(&self) -> &AtomicU32 {
        self.region.atomic_u32(self.readers_offset)
    }

    /// Acquires the lock for shared reading.
    pub fn read(&self) -> Result<ReadGuard<'_>, OrtakError> {
        if !self.enabled {
            return Ok(ReadGuard { lock: self, active: false });
        }
        let start = Instant::now();
        loop {
            let state = self.state().load(Ordering::Acquire);
            if state == WRITE_LOCKED {
                self.wait_for_change(state, start)?;
                continue;
            }
            let previous = self.readers().fetch_add(1, Ordering::AcqRel);
            if previous == 0 {
                // First reader marks the state word. A writer that slipped
                // in between the load above and our increment wins; back
                // out and go around.
                match self.state().compare_exchange(
                    UNLOCKED,
                    READ_LOCKED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) | Err(READ_LOCKED) => {
                        return Ok(ReadGuard { lock: self, active: true })
                    }
                    Err(_) => {
                        self.readers().fetch_sub(1, Ordering::AcqRel);
                        self.deadline(start)?;
                        continue;
                    }
                }
            }
            if self.state().load(Ordering::Acquire) == WRITE_LOCKED {
                self.readers().fetch_sub(1, Ordering::AcqRel);
                self.deadline(start)?;
                continue;
            }
            return Ok(ReadGuard { lock: self, active: true });
        }
    }

    /// Acquires the lock for exclusive writing.
    pub fn write(&self) -> Result<WriteGuard<'_>, OrtakError> {
        if !self.enabled {
            return Ok(WriteGuard { lock: self, active: false });
        }
        let start = Instant::now();
        loop {
            let state = self.state().load(Ordering::Acquire);
            if state == UNLOCKED
                && self
                    .state()
                    .compare_exchange(UNLOCKED, WRITE_LOCKED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                // Readers racing past the CAS observe WRITE_LOCKED and
                // back out; drain them before handing exclusivity over.
                let backoff = Backoff::new();
                while self.readers().load(Ordering::Acquire) != 0 {
                    if start.elapsed() >= self.timeout {
                        self.state().store(UNLOCKED, Ordering::Release);
                        futex_wake_all(self.state());
                        return Err(OrtakError::LockTimeout { waited: start.elapsed() });
                    }
                    backoff.snooze();
                }
                return Ok(WriteGuard { lock: self, active: true });
            }
            self.wait_for_change(state, start)?;
        }
    }

    /// Spins briefly, then parks on the state word until it no longer
    /// holds `seen` or the deadline passes.
    fn wait_for_change(&self, seen: u32, start: Instant) -> Result<(), OrtakError> {
        let backoff = Backoff::new();
        while self.state().load(Ordering::Acquire) == seen {
            self.deadline(start)?;
            if backoff.is_completed() {
                let remaining = self.timeout.saturating_sub(start.elapsed());
                futex_wait(self.state(), seen, remaining);
            } else {
                backoff.snooze();
            }
        }
        Ok(())
    }

    #[inline]
    fn deadline(&self, start: Instant) -> Result<(), OrtakError> {
        if start.elapsed() >= self.timeout {
            Err(OrtakError::LockTimeout { waited: start.elapsed() })
        } else {
            Ok(())
        }
    }

    fn release_read(&self) {
        if self.readers().fetch_sub(1, Ordering::AcqRel) == 1 {
            // Leave the word alone if a draining writer already owns it.
            let _ = self.state().compare_exchange(
                READ_LOCKED,
                UNLOCKED,
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
            futex_wake_all(self.state());
        }
    }

    fn release_write(&self) {
        self.state().store(UNLOCKED, Ordering::Release);
        futex_wake_all(self.state());
    }
}

/// Shared-read guard; releases on drop.
pub struct ReadGuard<'a> {
    lock: &'a RegionRwLock,
    active: bool,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.lock.release_read();
        }
    }
}

/// Exclusive-write guard; releases on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a RegionRwLock,
    active: bool,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.lock.release_write();
        }
    }
}
