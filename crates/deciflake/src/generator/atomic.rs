use core::marker::PhantomData;

use portable_atomic::{AtomicU128, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DecimalId, Error, IdentitySource, Result, TimeSource,
    generator::{DecimalGenerator, Poll, SequenceState, SequenceStep, bootstrap, default_backoff},
};

/// A lock-free node suitable for multi-threaded environments.
///
/// The sequence state (tick, issued-in-tick count, next suffix) is packed into
/// a single [`AtomicU128`] and advanced with one compare-and-swap, so a suffix
/// is handed out at most once even under contention.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Safely implement any [`DecimalId`] layout
///
/// ## Caveats
/// On targets without native 128-bit atomics, [`portable_atomic`] falls back
/// to a global lock table. Prefer [`LockNode`] there.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access is sacrificed for higher throughput
///
/// ## See Also
/// - [`BasicNode`]
/// - [`LockNode`]
///
/// [`BasicNode`]: crate::BasicNode
/// [`LockNode`]: crate::LockNode
pub struct AtomicNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    identity: u64,
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU128>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU128,
    time: T,
    _id: PhantomData<ID>,
}

impl<ID, T> AtomicNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    /// Creates a new [`AtomicNode`].
    ///
    /// # Errors
    ///
    /// - [`Error::IdentityOutOfRange`] if the identity does not fit the layout
    /// - [`Error::RecoveryHintOutOfRange`] if the hint is not a valid suffix
    /// - [`Error::TimeOutOfRange`] if the current tick does not fit the time
    ///   field
    ///
    /// # Example
    /// ```
    /// use deciflake::{AtomicNode, DeciflakeId, FixedIdentity, MonotonicClock};
    ///
    /// let node = AtomicNode::<DeciflakeId, _>::new(FixedIdentity(12), MonotonicClock::default(), Some(9_999))
    ///     .unwrap();
    ///
    /// std::thread::scope(|s| {
    ///     for _ in 0..4 {
    ///         s.spawn(|| node.next_id());
    ///     }
    /// });
    /// assert!(node.last_suffix().is_some());
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(identity, time)))]
    pub fn new(
        identity: impl IdentitySource,
        time: T,
        recovery_hint: Option<u64>,
    ) -> Result<Self, Error> {
        let (identity, state) = bootstrap::<ID, _, _>(&identity, &time, recovery_hint)?;
        Ok(Self::from_state(identity, state, time))
    }

    /// Creates a node from explicit component values.
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`Self::new`], which validates
    /// the identity and the recovery hint.
    pub fn from_components(identity: u64, next_suffix: u64, time: T) -> Self {
        debug_assert!(identity <= ID::max_identity(), "identity overflow");
        Self::from_state(
            identity,
            SequenceState::seeded(next_suffix, ID::sequence_modulus()),
            time,
        )
    }

    fn from_state(identity: u64, state: SequenceState, time: T) -> Self {
        Self {
            identity,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU128::new(state.to_bits())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU128::new(state.to_bits()),
            time,
            _id: PhantomData,
        }
    }

    /// Returns the identity encoded into every identifier of this node.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Returns the last suffix this node issued, if any.
    pub fn last_suffix(&self) -> Option<u64> {
        SequenceState::from_bits(self.state.load(Ordering::Acquire))
            .last_suffix(ID::sequence_modulus())
    }

    /// Generates the next identifier, stalling while the node is pending.
    pub fn next_id(&self) -> ID {
        self.next_id_with(default_backoff)
    }

    /// Generates the next identifier, calling `f` with the number of ticks to
    /// back off each time the node is pending.
    pub fn next_id_with(&self, mut f: impl FnMut(u64)) -> ID {
        loop {
            match self.poll_id() {
                Poll::Ready { id } => break id,
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Attempts to generate the next identifier.
    ///
    /// Besides the cases shared by every node, this returns
    /// `Poll::Pending { yield_for: 0 }` when another thread advanced the
    /// state first.
    pub fn poll_id(&self) -> Poll<ID> {
        match self.try_poll_id() {
            Ok(poll) => poll,
            Err(e) =>
            {
                #[allow(unreachable_code)]
                match e {}
            }
        }
    }

    /// A fallible version of [`Self::poll_id`] that returns a [`Result`].
    ///
    /// # Errors
    ///
    /// This method is infallible for this node. Use the [`Self::poll_id`]
    /// method instead.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll<ID>> {
        let now = self.time.current_ticks();
        let modulus = ID::sequence_modulus();

        let current_bits = self.state.load(Ordering::Acquire);
        let current = SequenceState::from_bits(current_bits);

        let (next, tick, suffix) = match current.advance(now, modulus) {
            SequenceStep::Ready {
                state,
                tick,
                suffix,
            } => (state, tick, suffix),
            SequenceStep::Pending { yield_for } => return Ok(Poll::Pending { yield_for }),
        };

        if self
            .state
            .compare_exchange(
                current_bits,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(Poll::Ready {
                id: ID::from_components(tick, self.identity, suffix),
            })
        } else {
            // Another thread won the race, retry immediately.
            Ok(Poll::Pending { yield_for: 0 })
        }
    }
}

impl<ID, T> DecimalGenerator<ID, T> for AtomicNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    type Err = core::convert::Infallible;

    fn new(
        identity: impl IdentitySource,
        time: T,
        recovery_hint: Option<u64>,
    ) -> Result<Self, Error> {
        Self::new(identity, time, recovery_hint)
    }

    fn identity(&self) -> u64 {
        self.identity()
    }

    fn last_suffix(&self) -> Option<u64> {
        self.last_suffix()
    }

    fn try_poll_id(&self) -> Result<Poll<ID>, Self::Err> {
        self.try_poll_id()
    }

    fn poll_id(&self) -> Poll<ID> {
        self.poll_id()
    }

    fn next_id(&self) -> ID {
        self.next_id()
    }
}
