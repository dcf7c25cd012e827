use crate::IdentitySource;

/// An externally assigned identity, e.g. from an orchestrator or config file.
///
/// The value is returned as-is, so a node built from an identity that is too
/// large for its layout fails at construction instead of being silently
/// truncated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FixedIdentity(pub u64);

impl IdentitySource for FixedIdentity {
    fn assign(&self, _max_identity: u64) -> u64 {
        self.0
    }
}

impl From<u64> for FixedIdentity {
    fn from(identity: u64) -> Self {
        Self(identity)
    }
}
