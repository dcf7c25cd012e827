use core::{fmt, hash::Hash, str::FromStr};

use crate::Error;

/// Trait for layout-compatible decimal identifiers.
///
/// An identifier packs three fields into one integer using decimal positional
/// weights, most significant first:
///
/// ```text
///  value = time * TIME_SHIFT + identity * IDENTITY_SHIFT + sequence
///
///  Digits:  +-----------+---------------+---------------+
///  Field:   | time (T)  | identity (I)  | sequence (S)  |
///           +-----------+---------------+---------------+
///           |<- most significant    least significant ->|
/// ```
///
/// Fields never overlap, so every value decomposes losslessly given the fixed
/// widths. Field values are exposed as `u64` regardless of the backing
/// integer.
///
/// Use [`crate::define_decimal_id!`] to declare a layout.
pub trait DecimalId:
    Copy
    + Clone
    + fmt::Display
    + fmt::Debug
    + PartialOrd
    + Ord
    + PartialEq
    + Eq
    + Hash
    + FromStr<Err = Error>
{
    /// Scalar type backing the identifier (typically `u64` or `u128`).
    type Ty: Copy + Clone + Default + fmt::Debug + fmt::Display + Ord + Hash;

    /// Number of decimal digits of the whole identifier.
    const WIDTH: usize;

    /// Returns the time field.
    fn time(&self) -> u64;

    /// Returns the identity field.
    fn identity(&self) -> u64;

    /// Returns the sequence field (the suffix).
    fn sequence(&self) -> u64;

    /// Largest value the time field can hold.
    fn max_time() -> u64;

    /// Largest value the identity field can hold.
    fn max_identity() -> u64;

    /// Number of distinct sequence values; suffixes wrap modulo this.
    fn sequence_modulus() -> u64;

    /// Composes an identifier from its fields. The sequence is reduced modulo
    /// [`DecimalId::sequence_modulus`].
    fn from_components(time: u64, identity: u64, sequence: u64) -> Self;

    /// Splits the identifier into `(time, identity, sequence)`.
    fn decompose(&self) -> (u64, u64, u64) {
        (self.time(), self.identity(), self.sequence())
    }

    /// Returns `true` if the raw value fits the fixed width.
    fn is_valid(&self) -> bool;

    /// Converts this type into its raw type representation
    fn to_raw(&self) -> Self::Ty;

    /// Converts a raw type into this type
    fn from_raw(raw: Self::Ty) -> Self;

    /// Returns the zero-padded, fixed-width decimal text.
    fn to_padded_string(&self) -> String;
}
