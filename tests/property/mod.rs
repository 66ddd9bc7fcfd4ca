//! Property tests for the round-robin and hashed selection strategies.

pub mod hashed;
pub mod round_robin;
