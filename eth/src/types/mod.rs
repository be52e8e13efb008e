mod address;
mod u256;

pub use address::*;
pub use u256::*;
