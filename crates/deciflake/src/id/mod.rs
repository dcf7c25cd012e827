mod decimal;
mod interface;

pub use decimal::*;
pub use interface::*;
