use rand::{Rng, rng};

use crate::IdentitySource;

/// An [`IdentitySource`] that draws a uniformly random identity from the
/// thread-local RNG (`rand::rng()`).
///
/// By default the draw covers the full identity field. Use
/// [`RandomIdentity::with_bound`] to narrow it, for example to `0..=1024` to
/// match a fleet that reserves the rest of the field for fixed identities.
///
/// This type does **not** store the RNG itself; it accesses the thread-local
/// generator on each call and is therefore freely shareable across threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomIdentity {
    bound: u64,
}

impl Default for RandomIdentity {
    fn default() -> Self {
        Self { bound: u64::MAX }
    }
}

impl RandomIdentity {
    /// Draws from `0..=bound`, further capped by the layout maximum.
    pub const fn with_bound(bound: u64) -> Self {
        Self { bound }
    }

    /// Returns the configured upper bound (inclusive).
    pub const fn bound(&self) -> u64 {
        self.bound
    }
}

impl IdentitySource for RandomIdentity {
    fn assign(&self, max_identity: u64) -> u64 {
        rng().random_range(0..=self.bound.min(max_identity))
    }
}
