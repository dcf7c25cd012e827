use core::fmt;

use crate::{
    DecimalId, Error, IdentitySource, Result, TimeSource,
    generator::{Poll, default_backoff},
};

/// A minimal interface for generating decimal identifiers on one node.
///
/// A node combines the current tick, its identity, and the next suffix of its
/// sequence state into an identifier. Implementations differ only in how the
/// sequence state is shared:
///
/// - [`BasicNode`]: single-threaded
/// - [`LockNode`]: mutex, thread-safe
/// - [`AtomicNode`]: lock-free CAS, thread-safe
///
/// [`BasicNode`]: crate::BasicNode
/// [`LockNode`]: crate::LockNode
/// [`AtomicNode`]: crate::AtomicNode
pub trait DecimalGenerator<ID, T>
where
    ID: DecimalId,
    T: TimeSource,
{
    /// The error type returned by the fallible generation methods.
    type Err: fmt::Debug;

    /// Creates a node, drawing its identity once from `identity`.
    ///
    /// With `recovery_hint = None` the sequence is seeded from the current
    /// tick (cold start). With `Some(last_suffix)` it resumes right after the
    /// last suffix the previous incarnation of this node issued (warm start).
    ///
    /// # Errors
    ///
    /// - [`Error::IdentityOutOfRange`] if the identity does not fit the layout
    /// - [`Error::RecoveryHintOutOfRange`] if the hint is not a valid suffix
    /// - [`Error::TimeOutOfRange`] if the current tick does not fit the time
    ///   field
    fn new(
        identity: impl IdentitySource,
        time: T,
        recovery_hint: Option<u64>,
    ) -> Result<Self, Error>
    where
        Self: Sized;

    /// Returns the identity encoded into every identifier of this node.
    fn identity(&self) -> u64;

    /// Returns the last suffix this node issued, if any.
    ///
    /// Checkpoint this value to warm-start the node's next incarnation.
    fn last_suffix(&self) -> Option<u64>;

    /// Attempts to generate the next identifier with fallible error handling.
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and
    /// it is poisoned.
    fn try_poll_id(&self) -> Result<Poll<ID>, Self::Err>;

    /// Attempts to generate the next identifier.
    ///
    /// This is the infallible counterpart to
    /// [`DecimalGenerator::try_poll_id`].
    fn poll_id(&self) -> Poll<ID>
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        match self.try_poll_id() {
            Ok(poll) => poll,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match e.into() {}
            }
        }
    }

    /// Generates the next identifier, calling `f` with the number of ticks to
    /// back off each time the node is pending.
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and
    /// it is poisoned.
    fn try_next_id_with(&self, mut f: impl FnMut(u64)) -> Result<ID, Self::Err> {
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Generates the next identifier using [`default_backoff`].
    ///
    /// # Errors
    ///
    /// May return an error if the underlying implementation uses a lock and
    /// it is poisoned.
    fn try_next_id(&self) -> Result<ID, Self::Err> {
        self.try_next_id_with(default_backoff)
    }

    /// Generates the next identifier, calling `f` while the node is pending.
    fn next_id_with(&self, f: impl FnMut(u64)) -> ID
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        match self.try_next_id_with(f) {
            Ok(id) => id,
            Err(e) => {
                #[allow(unreachable_code)]
                match e.into() {}
            }
        }
    }

    /// Generates the next identifier, stalling until one is available.
    ///
    /// Never returns an identifier that reuses a suffix within the same tick,
    /// and never one whose time field is behind a previously issued one.
    fn next_id(&self) -> ID
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        self.next_id_with(default_backoff)
    }
}
