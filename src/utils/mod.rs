//! Shared utilities.

pub mod duration;

pub use duration::parse_duration;
