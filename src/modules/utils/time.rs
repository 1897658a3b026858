use log::warn;

/// Source of the monotonic seconds stamped into auth tokens
pub trait MonotonicClock: Send + Sync {
    fn now_secs(&self) -> u32;
}

// Raw hardware clock where the platform has one, free of NTP slewing
#[cfg(any(target_os = "linux", target_os = "android"))]
const MONOTONIC_CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MONOTONIC_CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

/// System-wide monotonic clock in whole seconds.
///
/// Counts from an unspecified point fixed at boot, shared by every process
/// on the host, so token timestamps can be compared against the consumer's
/// own monotonic clock. Never goes backwards and ignores wall-clock changes.
/// Values saturate at `u32::MAX`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    fn now_secs(&self) -> u32 {
        let mut time = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `time` is a valid, writable timespec for the whole call
        let rc = unsafe { libc::clock_gettime(MONOTONIC_CLOCK_ID, &mut time) };
        if rc != 0 {
            warn!(
                "clock_gettime failed: {}",
                std::io::Error::last_os_error()
            );
            return 0;
        }
        u32::try_from(time.tv_sec).unwrap_or(u32::MAX)
    }
}
