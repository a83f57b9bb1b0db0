pub mod envs;
pub mod error;
pub mod paths;
pub mod promotion;

pub use error::{BrainError, Result};
