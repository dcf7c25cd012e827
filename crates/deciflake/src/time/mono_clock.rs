use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::{Error, Result, TICK, TimeSource, UNIX_EPOCH_OFFSET, time::duration_to_ticks};

/// Shared ticker thread that updates once per [`TICK`].
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source that returns elapsed ticks since process start,
/// offset from a user-defined epoch.
///
/// This avoids wall-clock adjustments (e.g., NTP steps) while still aligning
/// timestamps to a fixed origin, so the time field of a node's identifiers
/// never goes backward.
///
/// Internally, the clock captures `Instant::now()` at construction and adds
/// to it the number of ticks between the epoch and `SystemTime::now()`
/// observed at startup. Clones share the same ticker thread, which exits once
/// the last clone is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in ticks
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to the Unix epoch.
    ///
    /// A system clock set before 1970 is treated as sitting exactly on the
    /// epoch.
    fn default() -> Self {
        let offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::start(Instant::now(), duration_to_ticks(offset))
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using a custom epoch as the origin (t = 0),
    /// specified as a duration since the Unix epoch.
    ///
    /// Internally, the clock spawns a background thread that updates a shared
    /// atomic counter once per tick, using a monotonic timer (`Instant`) to
    /// measure elapsed time since startup. Reads never perform a syscall.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockBeforeEpoch`] if the current system time is
    /// earlier than `epoch`.
    ///
    /// # Example
    ///
    /// ```
    /// use deciflake::{CUSTOM_EPOCH, MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::with_epoch(CUSTOM_EPOCH).unwrap();
    /// let before = clock.current_ticks();
    /// std::thread::sleep(std::time::Duration::from_millis(30));
    /// assert!(clock.current_ticks() >= before);
    /// ```
    pub fn with_epoch(epoch: Duration) -> Result<Self, Error> {
        let start = Instant::now();
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::ClockBeforeEpoch)?;
        let offset = system_now
            .checked_sub(epoch)
            .ok_or(Error::ClockBeforeEpoch)?;

        Ok(Self::start(start, duration_to_ticks(offset)))
    }

    /// Constructs a clock anchored to the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockBeforeEpoch`] if the system clock is set before
    /// 1970.
    pub fn unix() -> Result<Self, Error> {
        Self::with_epoch(UNIX_EPOCH_OFFSET)
    }

    fn start(start: Instant, epoch_offset: u64) -> Self {
        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let tick_millis = TICK.as_millis() as u64;
            let mut tick: u64 = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target =
                    start + Duration::from_millis(tick.saturating_mul(tick_millis));

                let now = Instant::now();
                if now < target {
                    // Don't keep the clock alive while sleeping
                    drop(inner_ref);
                    thread::sleep(target - now);
                    continue;
                }

                let now_ticks = duration_to_ticks(start.elapsed());
                inner_ref.current.store(now_ticks, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ticks + 1;
            }
        });

        let _ = inner._handle.set(handle);

        Self {
            inner,
            epoch_offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the number of ticks since the configured epoch, based on the
    /// elapsed monotonic time since construction.
    fn current_ticks(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}
