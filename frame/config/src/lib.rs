pub mod envs;

pub use crate::envs::*;
