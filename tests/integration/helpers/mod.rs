//! Helper utilities for integration tests.

pub mod corpus;

pub use assertions::*;
pub use corpus::*;
