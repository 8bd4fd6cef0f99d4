//! Futex-style wait/wake on a 32-bit word inside a region.
//!
//! The Linux path issues the raw futex syscall in non-PRIVATE mode so
//! waiters in different processes mapping the same pages see each other.
//! Other unixes fall back to a bounded yield loop; callers always re-check
//! the word after waking, so spurious returns are harmless.

use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Blocks while `word` still holds `expected`, for at most `timeout`.
/// Returns on wake, timeout, signal or a concurrent change; the caller
/// re-reads the word either way.
#[cfg(target_os = "linux")]
pub(crate) fn futex_wait(word: &AtomicU32, expected: u32, timeout: Duration) {
    let ts = libc::timespec {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as _,
    };
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            &ts as *const libc::timespec,
        );
    }
}

/// Wakes every waiter parked on `word`.
#[cfg(target_os = "linux")]
pub(crate) fn futex_wake_all(word: &AtomicU32) {
    unsafe {
        libc::syscall(libc::SYS_futex, word.as_ptr(), libc::FUTEX_WAKE, i32::MAX);
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn futex_wait(word: &AtomicU32, expected: u32, timeout: Duration) {
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    let start = Instant::now();
    let slice = Duration::from_micros(50);
    while word.load(Ordering::Acquire) == expected && start.elapsed() < timeout {
        std::thread::park_timeout(slice);
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn futex_wake_all(_word: &AtomicU32) {
    // Fallback waiters poll; nothing to signal.
}
