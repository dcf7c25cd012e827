/// A trait for sources of node identities.
///
/// A node asks its identity source exactly once, at construction. The
/// returned value must lie in `[0, max_identity]`; anything larger is
/// rejected by the node with [`crate::Error::IdentityOutOfRange`].
///
/// Identities are not coordinated between nodes. A random draw relies on the
/// size of the range to make a same-tick, same-identity collision rare; an
/// orchestrator that hands out distinct identities removes that risk
/// entirely.
///
/// # Example
///
/// ```
/// use deciflake::IdentitySource;
///
/// struct Rack(u64);
/// impl IdentitySource for Rack {
///     fn assign(&self, max_identity: u64) -> u64 {
///         self.0 % (max_identity + 1)
///     }
/// }
///
/// assert_eq!(Rack(10_003).assign(9_999), 3);
/// ```
pub trait IdentitySource {
    /// Returns an identity no greater than `max_identity`.
    fn assign(&self, max_identity: u64) -> u64;
}

impl<I: IdentitySource + ?Sized> IdentitySource for &I {
    fn assign(&self, max_identity: u64) -> u64 {
        (**self).assign(max_identity)
    }
}
