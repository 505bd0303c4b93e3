//! Network topology module.
//!
//! This module contains the participant types and the builder that creates
//! the access point and the ordinary nodes on the substrate.

pub mod builder;
pub mod types;

// Re-export key types for easier access
pub use builder::TopologyBuilder;
pub use types::{Participant, ParticipantId, Role, Topology};
