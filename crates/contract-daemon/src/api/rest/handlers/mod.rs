//! API request handlers

mod contracts;
mod health;

pub use contracts::*;
pub use health::*;
