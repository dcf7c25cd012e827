//! # Fixed-width decimal identifiers
//!
//! This module provides a macro for declaring decimal identifier layouts with
//! a chosen number of digits per field, and the default [`DeciflakeId`]
//! layout.
//!
//! Example usage:
//!
//! ```
//! use deciflake::{DecimalId, define_decimal_id};
//!
//! define_decimal_id!(
//!     ShortId, u64,
//!     time: 11,
//!     identity: 3,
//!     sequence: 4
//! );
//!
//! let id = ShortId::from_components(1_000, 42, 7);
//! assert_eq!(id.to_raw(), 10_000_420_007);
//! assert_eq!(id.decompose(), (1_000, 42, 7));
//! ```

/// Declares a [`DecimalId`]-compatible type with custom field widths,
/// expressed in decimal digits.
///
/// The macro defines a packed identifier over a fixed-size integer (`u64` or
/// `u128`) and generates the positional multipliers, field maxima and
/// accessors for each component.
///
/// A layout that cannot be represented by the backing integer fails a
/// compile-time assertion. So do a sequence field wider than 9 digits and a
/// time or identity field wider than 19 digits, since node state keeps them in
/// 32- and 64-bit words.
///
/// ## Digit layout
///
/// ```text
///  Digit Index: most significant                least significant
///               +------------+--------------+--------------+
///  Field:       |  time (T)  | identity (I) | sequence (S) |
///               +------------+--------------+--------------+
///               |<------------ T + I + S digits ---------->|
/// ```
///
/// ## Example
///
/// ```
/// deciflake::define_decimal_id!(
///     MyId, u128,
///     time: 12,
///     identity: 4,
///     sequence: 4
/// );
/// ```
///
/// This creates a type `MyId` with:
///
/// - 12 digits for the time (multiplied by `10^8`)
/// - 4 digits for the identity (multiplied by `10^4`)
/// - 4 digits for the sequence (`SEQUENCE_MODULUS = 10^4`)
///
/// [`DecimalId`]: crate::DecimalId
#[macro_export]
macro_rules! define_decimal_id {
    (
        $(#[$meta:meta])*
        $name:ident, $int:ty,
        time: $time_digits:expr,
        identity: $identity_digits:expr,
        sequence: $sequence_digits:expr
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            id: $int,
        }

        const _: () = {
            // Compile-time check: every value of the layout must be
            // representable, otherwise the time field silently wraps.
            assert!(
                $time_digits + $identity_digits + $sequence_digits <= <$int>::MAX.ilog10(),
                "Decimal layout overflows the underlying integer type"
            );
            assert!(
                $time_digits > 0 && $identity_digits > 0 && $sequence_digits > 0,
                "Every decimal field needs at least one digit"
            );
            assert!($time_digits <= 19, "Time field must fit in a u64");
            assert!($identity_digits <= 19, "Identity field must fit in a u64");
            assert!($sequence_digits <= 9, "Sequence field must fit in a u32");
        };

        impl $name {
            pub const TIME_DIGITS: u32 = $time_digits;
            pub const IDENTITY_DIGITS: u32 = $identity_digits;
            pub const SEQUENCE_DIGITS: u32 = $sequence_digits;
            pub const WIDTH: usize =
                (Self::TIME_DIGITS + Self::IDENTITY_DIGITS + Self::SEQUENCE_DIGITS) as usize;

            pub const SEQUENCE_MODULUS: $int = (10 as $int).pow(Self::SEQUENCE_DIGITS);
            pub const IDENTITY_MODULUS: $int = (10 as $int).pow(Self::IDENTITY_DIGITS);
            pub const TIME_MODULUS: $int = (10 as $int).pow(Self::TIME_DIGITS);

            pub const IDENTITY_SHIFT: $int = Self::SEQUENCE_MODULUS;
            pub const TIME_SHIFT: $int = Self::IDENTITY_SHIFT * Self::IDENTITY_MODULUS;

            pub const MAX_TIME: $int = Self::TIME_MODULUS - 1;
            pub const MAX_IDENTITY: $int = Self::IDENTITY_MODULUS - 1;
            pub const MAX_RAW: $int = Self::TIME_SHIFT * Self::TIME_MODULUS - 1;

            /// Composes an identifier, reducing each field to its width.
            pub const fn from(time: u64, identity: u64, sequence: u64) -> Self {
                let t = (time as $int % Self::TIME_MODULUS) * Self::TIME_SHIFT;
                let i = (identity as $int % Self::IDENTITY_MODULUS) * Self::IDENTITY_SHIFT;
                let s = sequence as $int % Self::SEQUENCE_MODULUS;
                Self { id: t + i + s }
            }

            /// Extracts the time from the packed ID.
            pub const fn time(&self) -> u64 {
                (self.id / Self::TIME_SHIFT) as u64
            }

            /// Extracts the identity from the packed ID.
            pub const fn identity(&self) -> u64 {
                ((self.id / Self::IDENTITY_SHIFT) % Self::IDENTITY_MODULUS) as u64
            }

            /// Extracts the sequence from the packed ID.
            pub const fn sequence(&self) -> u64 {
                (self.id % Self::SEQUENCE_MODULUS) as u64
            }

            /// Returns the maximum representable time value.
            pub const fn max_time() -> u64 {
                Self::MAX_TIME as u64
            }

            /// Returns the maximum representable identity value.
            pub const fn max_identity() -> u64 {
                Self::MAX_IDENTITY as u64
            }

            /// Returns the number of distinct sequence values.
            pub const fn sequence_modulus() -> u64 {
                Self::SEQUENCE_MODULUS as u64
            }

            /// Returns `true` if the value fits the fixed width.
            pub const fn is_valid(&self) -> bool {
                self.id <= Self::MAX_RAW
            }

            pub const fn to_raw(&self) -> $int {
                self.id
            }

            pub const fn from_raw(raw: $int) -> Self {
                Self { id: raw }
            }
        }

        impl $crate::DecimalId for $name {
            type Ty = $int;

            const WIDTH: usize = Self::WIDTH;

            fn time(&self) -> u64 {
                self.time()
            }

            fn identity(&self) -> u64 {
                self.identity()
            }

            fn sequence(&self) -> u64 {
                self.sequence()
            }

            fn max_time() -> u64 {
                Self::max_time()
            }

            fn max_identity() -> u64 {
                Self::max_identity()
            }

            fn sequence_modulus() -> u64 {
                Self::sequence_modulus()
            }

            fn from_components(time: u64, identity: u64, sequence: u64) -> Self {
                debug_assert!(time <= Self::max_time(), "time overflow");
                debug_assert!(identity <= Self::max_identity(), "identity overflow");
                Self::from(time, identity, sequence)
            }

            fn is_valid(&self) -> bool {
                self.is_valid()
            }

            fn to_raw(&self) -> Self::Ty {
                self.id
            }

            fn from_raw(raw: Self::Ty) -> Self {
                Self { id: raw }
            }

            fn to_padded_string(&self) -> String {
                format!("{:0width$}", self.id, width = Self::WIDTH)
            }
        }

        impl From<$name> for $int {
            fn from(id: $name) -> Self {
                id.to_raw()
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err($crate::Error::InvalidDigit { position: 0 });
                }

                let mut raw: $int = 0;
                for (position, byte) in s.bytes().enumerate() {
                    if !byte.is_ascii_digit() {
                        return Err($crate::Error::InvalidDigit { position });
                    }
                    if position >= Self::WIDTH {
                        return Err($crate::Error::DecodeOverflow);
                    }
                    raw = raw * 10 + <$int>::from(byte - b'0');
                }

                let id = Self::from_raw(raw);
                if !id.is_valid() {
                    return Err($crate::Error::DecodeOverflow);
                }
                Ok(id)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{:0width$}", self.id, width = Self::WIDTH)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let full = core::any::type_name::<Self>();
                let name = full.rsplit("::").next().unwrap_or(full);
                let mut dbg = f.debug_struct(name);
                dbg.field("id", &format_args!("{}", self.id));
                dbg.field("time", &self.time());
                dbg.field("identity", &self.identity());
                dbg.field("sequence", &self.sequence());
                dbg.finish()
            }
        }
    };
}

define_decimal_id!(
    /// A 20-digit decimal identifier.
    ///
    /// - 12 digits time (10 ms ticks since the clock epoch)
    /// - 4 digits node identity
    /// - 4 digits sequence suffix
    ///
    /// ```text
    ///  Digit Index:  19          8 7          4 3          0
    ///               +-------------+------------+------------+
    ///  Field:       |  time (12)  | ident (4)  |  seq (4)   |
    ///               +-------------+------------+------------+
    ///               |<--- most significant -- 20 digits --->|
    /// ```
    ///
    /// 20 digits exceed `u64::MAX` once the time field passes
    /// `184_467_440_737`, so the layout is backed by `u128`.
    DeciflakeId, u128,
    time: 12,
    identity: 4,
    sequence: 4
);
