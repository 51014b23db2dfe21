//! Utility functions used throughout the crate.

pub mod vertex;

pub use vertex::*;
