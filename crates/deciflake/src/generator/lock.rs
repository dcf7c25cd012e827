use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DecimalId, Error, IdentitySource, Result, TimeSource,
    generator::{DecimalGenerator, Mutex, Poll, SequenceState, SequenceStep, bootstrap},
};

/// A lock-based node suitable for multi-threaded environments.
///
/// The sequence state is wrapped in an [`Arc<Mutex<_>>`], so the
/// read-then-increment step is a single critical section and clones of the
/// node share one suffix stream.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Safely implement any [`DecimalId`] layout
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
/// - Your target doesn't support 128-bit atomics
///
/// ## See Also
/// - [`BasicNode`]
/// - [`AtomicNode`]
///
/// [`BasicNode`]: crate::BasicNode
/// [`AtomicNode`]: crate::AtomicNode
pub struct LockNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    identity: u64,
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<SequenceState>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<SequenceState>>,
    time: T,
    _id: PhantomData<ID>,
}

impl<ID, T> Clone for LockNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            state: Arc::clone(&self.state),
            time: self.time.clone(),
            _id: PhantomData,
        }
    }
}

impl<ID, T> LockNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    /// Creates a new [`LockNode`].
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
    /// use deciflake::{DeciflakeId, FixedIdentity, LockNode, MonotonicClock, Poll};
    ///
    /// let node = LockNode::<DeciflakeId, _>::new(FixedIdentity(7), MonotonicClock::default(), None)
    ///     .unwrap();
    ///
    /// let id = loop {
    ///     match node.try_poll_id() {
    ///         Ok(Poll::Ready { id }) => break id,
    ///         Ok(Poll::Pending { .. }) => std::thread::yield_now(),
    ///         Err(e) => panic!("node error: {e}"),
    ///     }
    /// };
    /// assert_eq!(id.identity(), 7);
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
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(state))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(state)),
            time,
            _id: PhantomData,
        }
    }

    /// Returns the identity encoded into every identifier of this node.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Returns the last suffix this node issued, if any.
    ///
    /// The state is a plain value that is only ever replaced whole, so it is
    /// read even if another thread panicked while holding the lock.
    pub fn last_suffix(&self) -> Option<u64> {
        let state = {
            #[cfg(feature = "parking-lot")]
            {
                *self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                *self
                    .state
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
            }
        };
        state.last_suffix(ID::sequence_modulus())
    }

    /// Attempts to generate the next identifier with fallible error handling.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: A new identifier is available
    /// - `Ok(Poll::Pending { yield_for })`: The ticks to wait before trying
    ///   again
    /// - `Err(e)`: the lock was poisoned
    ///
    /// # Errors
    /// - Returns an error if the underlying lock has been poisoned.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll<ID>, Error> {
        let modulus = ID::sequence_modulus();

        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        // Read the clock under the lock so ticks are observed in issue order
        let now = self.time.current_ticks();

        match state.advance(now, modulus) {
            SequenceStep::Ready {
                state: next,
                tick,
                suffix,
            } => {
                *state = next;
                Ok(Poll::Ready {
                    id: ID::from_components(tick, self.identity, suffix),
                })
            }
            SequenceStep::Pending { yield_for } => Ok(Poll::Pending { yield_for }),
        }
    }
}

impl<ID, T> DecimalGenerator<ID, T> for LockNode<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    type Err = Error;

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
}
