//! Participant and topology type definitions.

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};

use crate::layout::Position;
use crate::radio::RadiusClass;
use crate::substrate::{InterfaceAddresses, NodeHandle};

/// Scenario-level participant identity. The access point is always 0,
/// ordinary nodes are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    pub const ACCESS_POINT: ParticipantId = ParticipantId(0);

    /// Id of the ordinary node at zero-based `index`
    pub fn node(index: usize) -> Self {
        ParticipantId(index as u32 + 1)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What a participant is in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The sink every ordinary node can reach directly
    AccessPoint,
    /// A sensor-like node; `index` is its zero-based position in the grid
    OrdinaryNode { index: usize },
}

impl Role {
    pub fn is_access_point(&self) -> bool {
        matches!(self, Role::AccessPoint)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AccessPoint => "access_point",
            Role::OrdinaryNode { .. } => "node",
        }
    }
}

/// One simulated participant.
///
/// Position and radius class are written once while the topology is built
/// and never change afterwards. Addresses are filled in by the addressing
/// phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub role: Role,
    pub handle: NodeHandle,
    pub position: Option<Position>,
    pub radius_class: Option<RadiusClass>,
    pub addresses: Option<InterfaceAddresses>,
}

impl Participant {
    pub fn new(id: ParticipantId, role: Role, handle: NodeHandle) -> Self {
        Self {
            id,
            role,
            handle,
            position: None,
            radius_class: None,
            addresses: None,
        }
    }

    /// Address probes are sent to
    pub fn global_address(&self) -> Option<Ipv6Addr> {
        self.addresses.and_then(|a| a.global)
    }
}

/// Access point plus ordinary nodes, all on one PAN
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub pan_id: u16,
    access_point: Option<Participant>,
    nodes: Vec<Participant>,
}

impl Topology {
    pub fn new(pan_id: u16, access_point: Option<Participant>, nodes: Vec<Participant>) -> Self {
        Self {
            pan_id,
            access_point,
            nodes,
        }
    }

    pub fn access_point(&self) -> Option<&Participant> {
        self.access_point.as_ref()
    }

    pub fn nodes(&self) -> &[Participant] {
        &self.nodes
    }

    /// All participants, access point first, then nodes by index
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.access_point.iter().chain(self.nodes.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.access_point.iter_mut().chain(self.nodes.iter_mut())
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.iter().find(|p| p.id == id)
    }

    pub fn handles(&self) -> Vec<NodeHandle> {
        self.iter().map(|p| p.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + usize::from(self.access_point.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
