use core::time::Duration;

/// Length of one clock tick. The time field of every identifier counts these.
///
/// Ten milliseconds keeps a 12-digit time field valid until the year 2286
/// when counted from the Unix epoch. Each node can therefore issue up to
/// `SEQUENCE_MODULUS` identifiers per 10 ms.
pub const TICK: Duration = Duration::from_millis(10);

/// Standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const UNIX_EPOCH_OFFSET: Duration = Duration::from_millis(0);

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// A trait for time sources that return a monotonic tick count.
///
/// This abstraction allows you to plug in a real clock or a mocked time source
/// in tests. All nodes sharing an identifier namespace must agree on both the
/// tick length (see [`TICK`]) and the epoch.
///
/// # Example
///
/// ```
/// use deciflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_ticks(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the number of ticks elapsed since the configured epoch.
    fn current_ticks(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_ticks(&self) -> u64 {
        (**self).current_ticks()
    }
}

/// Converts a duration to whole ticks, rounding down.
pub(crate) const fn duration_to_ticks(duration: Duration) -> u64 {
    (duration.as_millis() / TICK.as_millis()) as u64
}
