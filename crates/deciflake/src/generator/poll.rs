use core::time::Duration;

use crate::TICK;

/// Represents the result of attempting to generate a new identifier.
///
/// - [`Poll::Ready`] indicates a new identifier was generated.
/// - [`Poll::Pending`] means the node cannot produce a unique identifier right
///   now: the current tick's suffixes are exhausted, the clock moved backward,
///   or (for the atomic node) another thread won the race. Retry after
///   `yield_for` ticks.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use deciflake::{BasicNode, DeciflakeId, FixedIdentity, Poll, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> u64 {
///         1
///     }
/// }
///
/// let node = BasicNode::<DeciflakeId, _>::new(FixedIdentity(3), FixedTime, None).unwrap();
/// match node.poll_id() {
///     Poll::Ready { id } => println!("ID: {id}"),
///     Poll::Pending { yield_for } => println!("Back off for {yield_for} ticks"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    /// A unique identifier was generated and is ready to use.
    Ready {
        /// The generated identifier.
        id: T,
    },
    /// No identifier could be generated right now.
    Pending {
        /// Number of ticks to wait before trying again. Zero means retry
        /// immediately.
        yield_for: u64,
    },
}

/// The backoff used by `next_id` when a node reports [`Poll::Pending`].
///
/// Spins for a lost race, yields the thread while waiting for the next tick,
/// and sleeps through longer gaps such as a clock that was stepped back.
pub fn default_backoff(yield_for: u64) {
    match yield_for {
        0 => core::hint::spin_loop(),
        1 => std::thread::yield_now(),
        n => {
            let ticks = u32::try_from(n - 1).unwrap_or(u32::MAX);
            std::thread::sleep(TICK.checked_mul(ticks).unwrap_or(Duration::MAX));
        }
    }
}
