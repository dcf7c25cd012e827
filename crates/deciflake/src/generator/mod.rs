mod atomic;
mod basic;
mod interface;
mod lock;
mod mutex;
mod poll;
mod sequence;
#[cfg(test)]
mod tests;

pub use atomic::*;
pub use basic::*;
pub use interface::*;
pub use lock::*;
pub use mutex::*;
pub use poll::*;
pub use sequence::*;
