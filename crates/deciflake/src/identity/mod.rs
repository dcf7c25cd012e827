mod fixed;
mod interface;
mod thread_random;

pub use fixed::*;
pub use interface::*;
pub use thread_random::*;
