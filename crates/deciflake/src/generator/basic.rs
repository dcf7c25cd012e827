use core::cell::Cell;
use core::marker::PhantomData;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DecimalId, Error, IdentitySource, Result, TimeSource,
    generator::{DecimalGenerator, Poll, SequenceState, SequenceStep, bootstrap, default_backoff},
};

/// A non-concurrent node suitable for single-threaded environments.
///
/// This node is lightweight and fast, but **not thread-safe**: the sequence
/// state lives in a [`Cell`], so the read-then-increment step cannot race.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ Safely implement any [`DecimalId`] layout
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - You want the fastest node
///
/// ## See Also
/// - [`LockNode`]
/// - [`AtomicNode`]
///
/// [`LockNode`]: crate::LockNode
/// [`AtomicNode`]: crate::AtomicNode
pub struct BasicNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    identity: u64,
    state: Cell<SequenceState>,
    time: T,
    _id: PhantomData<ID>,
}

impl<ID, T> BasicNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    /// Creates a new [`BasicNode`].
    ///
    /// The identity is drawn once from `identity`. Without a recovery hint
    /// the sequence starts at `now mod SEQUENCE_MODULUS`; with
    /// `Some(last_suffix)` it starts right after `last_suffix`.
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
    /// use deciflake::{BasicNode, DeciflakeId, MonotonicClock, RandomIdentity};
    ///
    /// let node = BasicNode::<DeciflakeId, _>::new(
    ///     RandomIdentity::default(),
    ///     MonotonicClock::default(),
    ///     None,
    /// )
    /// .unwrap();
    ///
    /// let id = node.next_id();
    /// assert_eq!(id.identity(), node.identity());
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
    /// This constructor is primarily useful for tests and for restoring a
    /// node whose identity is already validated. `next_suffix` is reduced
    /// modulo the sequence modulus.
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
            state: Cell::new(state),
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
        self.state.get().last_suffix(ID::sequence_modulus())
    }

    /// Generates the next identifier, stalling while the node is pending.
    ///
    /// # Example
    /// ```
    /// use deciflake::{BasicNode, DeciflakeId, FixedIdentity, MonotonicClock};
    ///
    /// let clock = MonotonicClock::default();
    /// let node = BasicNode::<DeciflakeId, _>::new(FixedIdentity(7), clock, Some(41)).unwrap();
    ///
    /// let id = node.next_id();
    /// assert_eq!(id.sequence(), 42);
    /// ```
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
    /// Returns [`Poll::Pending`] if every suffix of the current tick was
    /// already issued or the clock is behind the last issued identifier.
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

        match self.state.get().advance(now, modulus) {
            SequenceStep::Ready {
                state,
                tick,
                suffix,
            } => {
                self.state.set(state);
                Ok(Poll::Ready {
                    id: ID::from_components(tick, self.identity, suffix),
                })
            }
            SequenceStep::Pending { yield_for } => Ok(Poll::Pending { yield_for }),
        }
    }
}

impl<ID, T> DecimalGenerator<ID, T> for BasicNode<ID, T>
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
