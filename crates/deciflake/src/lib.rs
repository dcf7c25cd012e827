mod error;
mod generator;
mod id;
mod identity;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::identity::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
