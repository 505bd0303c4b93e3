//! # Simulation substrate interfaces
//!
//! The scenario builder never simulates anything itself. It configures an
//! external substrate through four collaborator traits and reads back the
//! facts the substrate derives (addresses, inter-node distances):
//!
//! - [`Engine`]: participant creation, PAN association, probe
//!   installation, trace requests, the run itself and teardown
//! - [`Radio`]: per-participant transmit power profiles
//! - [`Addressing`]: link-local and global IPv6 address assignment
//! - [`Mobility`]: fixed positions and distance queries
//!
//! [`Substrate`] is implemented for any type providing all four.
//!
//! ## Reference backend
//!
//! [`PlanBackend`] records every configuration command into a
//! [`SimulationPlan`] which is serialized to YAML when the run is
//! requested. The external engine consumes that plan:
//!
//! ```yaml
//! general:
//!   stop_time: 100s
//!   pan_id: 0
//! nodes:
//!   0:
//!     short_address: "00:01"
//!     position: { x: 100.0, y: 100.0, z: 0.0 }
//!     power: { tx_power_dbm: 9.0, channel: 11 }
//! probes:
//!   - source: 1
//!     destination: 0
//!     payload_size: 16
//! ```

pub mod addressing;
pub mod plan;

use std::fmt;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::layout::Position;
use crate::probe::ProbeTask;
use crate::radio::TxPowerProfile;

pub use addressing::{Ipv6Prefix, LOOPBACK_INTERFACE, RADIO_INTERFACE};
pub use plan::{PlanBackend, PlanNode, SimulationPlan};

/// Substrate-side handle for a created participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u32);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{:03}", self.0)
    }
}

/// Addresses bound to one interface of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddresses {
    pub link_local: Ipv6Addr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<Ipv6Addr>,
}

/// Trace and animation files requested from the engine. The files
/// themselves belong to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRequest {
    /// ASCII packet trace file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascii: Option<String>,
    /// Prefix for per-device pcap captures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcap_prefix: Option<String>,
    /// Animation export file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
}

impl ArtifactRequest {
    pub fn is_empty(&self) -> bool {
        self.ascii.is_none() && self.pcap_prefix.is_none() && self.animation.is_none()
    }
}

/// What the engine reports back after a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub stop_time: Duration,
    pub probes: usize,
    /// Where the engine wrote its plan, if anywhere
    pub plan_path: Option<PathBuf>,
}

/// Substrate failures. These are not recoverable by the builder.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("unknown node {0}")]
    UnknownNode(NodeHandle),
    #[error("node {0} has no LR-WPAN device (not associated to a PAN)")]
    NoRadioDevice(NodeHandle),
    #[error("no 16-bit short address left for node {0}")]
    ShortAddressesExhausted(NodeHandle),
    #[error("prefix {0} leaves no room for a 64-bit interface identifier")]
    InvalidPrefix(Ipv6Prefix),
    #[error("simulation already ran")]
    AlreadyRan,
    #[error("simulation was torn down")]
    TornDown,
    #[error("failed to write simulation plan: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize simulation plan: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Event engine and participant lifecycle
pub trait Engine {
    /// Create `count` participants and return their handles in creation order
    fn create_participants(&mut self, count: usize) -> Result<Vec<NodeHandle>, SubstrateError>;

    /// Attach participants to one broadcast domain under `pan_id`
    fn associate_to_pan(&mut self, nodes: &[NodeHandle], pan_id: u16) -> Result<(), SubstrateError>;

    /// Ask the engine to produce trace/animation files during the run
    fn request_artifacts(&mut self, request: &ArtifactRequest) -> Result<(), SubstrateError>;

    /// Install one probe task on its source participant
    fn install_probe(&mut self, task: &ProbeTask) -> Result<(), SubstrateError>;

    /// Run until `stop_time` of simulated time
    fn run_until(&mut self, stop_time: Duration) -> Result<RunReport, SubstrateError>;

    fn teardown(&mut self);
}

/// Radio physical layer
pub trait Radio {
    /// Attach a transmit power profile to the participant's LR-WPAN device
    fn attach_power_profile(
        &mut self,
        node: NodeHandle,
        profile: &TxPowerProfile,
    ) -> Result<(), SubstrateError>;
}

/// IPv6 addressing over 6LoWPAN
pub trait Addressing {
    /// Assign link-local and global addresses under `prefix`
    fn assign_addresses(&mut self, nodes: &[NodeHandle], prefix: &Ipv6Prefix) -> Result<(), SubstrateError>;

    /// Look up the addresses of one interface of a participant
    fn addresses(&self, node: NodeHandle, interface: u32) -> Option<InterfaceAddresses>;
}

/// Constant-position mobility
pub trait Mobility {
    fn set_position(&mut self, node: NodeHandle, position: Position) -> Result<(), SubstrateError>;

    /// Distance in meters, if both participants have a position
    fn distance(&self, a: NodeHandle, b: NodeHandle) -> Option<f64>;
}

/// Everything the scenario builder needs from a substrate
pub trait Substrate: Engine + Radio + Addressing + Mobility {}

impl<T: Engine + Radio + Addressing + Mobility> Substrate for T {}
