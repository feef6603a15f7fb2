pub mod interface;
pub mod types;

pub use crate::interface::*;
pub use crate::types::*;
