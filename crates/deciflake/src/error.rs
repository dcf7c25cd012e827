use core::fmt;

/// A result type that is infallible by default.
///
/// Most `deciflake` APIs are infallible once a node has been constructed.
/// Construction, text decoding, and the std-mutex node are the fallible
/// exceptions.
pub type Result<T, E = core::convert::Infallible> = core::result::Result<T, E>;

/// All error variants that `deciflake` can emit.
///
/// Configuration problems (an out-of-range identity or recovery hint, a clock
/// epoch in the future, a clock too far ahead for the layout) are reported when a node or clock is built, never
/// while identifiers are being generated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Error {
    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is never produced.
    LockPoisoned,

    /// The identity source produced a value that does not fit the identity
    /// field of the layout.
    IdentityOutOfRange {
        /// The rejected identity.
        identity: u64,
        /// The largest identity the layout can encode.
        max: u64,
    },

    /// The recovery hint is not a suffix the layout could have issued.
    RecoveryHintOutOfRange {
        /// The rejected hint.
        hint: u64,
        /// The sequence modulus; valid hints are `0..modulus`.
        modulus: u64,
    },

    /// The system clock reports a time earlier than the requested clock epoch.
    ClockBeforeEpoch,

    /// The time source reports a tick that does not fit the time field of the
    /// layout. Pick a later epoch or a wider time field.
    TimeOutOfRange {
        /// The tick reported at construction.
        ticks: u64,
        /// The largest tick the layout can encode.
        max: u64,
    },

    /// Decimal text contained a character that is not an ASCII digit.
    InvalidDigit {
        /// Byte offset of the offending character.
        position: usize,
    },

    /// Decimal text or a raw value does not fit the fixed-width layout.
    DecodeOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LockPoisoned => write!(fmt, "node state lock poisoned"),
            Self::IdentityOutOfRange { identity, max } => {
                write!(fmt, "identity {identity} exceeds the layout maximum {max}")
            }
            Self::RecoveryHintOutOfRange { hint, modulus } => {
                write!(fmt, "recovery hint {hint} must be below {modulus}")
            }
            Self::ClockBeforeEpoch => write!(fmt, "system clock is before the clock epoch"),
            Self::TimeOutOfRange { ticks, max } => {
                write!(fmt, "clock tick {ticks} exceeds the layout maximum {max}")
            }
            Self::InvalidDigit { position } => {
                write!(fmt, "invalid decimal digit at position {position}")
            }
            Self::DecodeOverflow => write!(fmt, "value does not fit the identifier layout"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
