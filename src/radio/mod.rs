//! Radio reachability.
//!
//! Each participant carries exactly one radius class. The access point
//! class must reach strictly farther than the node class, which produces a
//! star-like topology around the access point whenever the grid spacing
//! exceeds the node range.

pub mod assigner;
pub mod profile;

pub use assigner::{assign_reachability, ReachabilityError, ReachabilityProfile};
pub use profile::{RadiusClass, TxPowerProfile};
