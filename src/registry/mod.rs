//! # Participant Registry
//!
//! After a completed run the scenario emits diagnostics for every
//! participant: its addresses, its position and how far it is from the
//! access point. The registry collects these facts from the scenario and
//! the mobility substrate and writes them to `participants.json` next to
//! the simulation plan.
//!
//! ## Reachability Columns
//!
//! Two flags summarize the asymmetric reachability design for each node:
//!
//! - `uplink_in_range`: the node's own radius class reaches the access point
//! - `downlink_in_range`: the access point's radius class reaches the node
//!
//! With the default classes (50 m nodes, 200 m access point) every node on
//! a 200 m grid has a downlink, while the uplink depends on the node's
//! distance from the center.
//!
//! ## Example Registry Structure
//!
//! ```json
//! {
//!   "pan_id": 0,
//!   "spacing": 90,
//!   "row_width": 3,
//!   "nodes": [
//!     {
//!       "id": 1,
//!       "role": "node",
//!       "radius_class": "node-50m",
//!       "link_local": "fe80::ff:fe00:2",
//!       "global": "2020:1::ff:fe00:2",
//!       "distance_to_access_point": 141.42
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::io;
use std::net::Ipv6Addr;
use std::path::Path;

use serde::Serialize;

use crate::layout::Position;
use crate::scenario::{Phase, Scenario, ScenarioError};
use crate::substrate::Mobility;
use crate::topology::{Participant, ParticipantId};

/// Diagnostics for one participant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub id: ParticipantId,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_local: Option<Ipv6Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<Ipv6Addr>,
    /// Only for ordinary nodes, and only when there is an access point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_access_point: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplink_in_range: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downlink_in_range: Option<bool>,
}

/// Per-participant diagnostics of a completed scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRegistry {
    pub pan_id: u16,
    pub spacing: u32,
    pub row_width: u32,
    pub nodes: Vec<NodeInfo>,
}

impl NodeRegistry {
    /// Collect diagnostics from a completed scenario. Distances are read
    /// back from the mobility substrate rather than recomputed.
    pub fn collect<M: Mobility + ?Sized>(scenario: &Scenario, mobility: &M) -> Result<Self, ScenarioError> {
        scenario.expect_phase(Phase::Completed, "collect diagnostics")?;
        let topology = scenario.topology();
        let access_point = topology.access_point();

        let nodes = topology
            .iter()
            .map(|participant| node_info(participant, access_point, mobility))
            .collect();

        Ok(Self {
            pan_id: topology.pan_id,
            spacing: scenario.layout().spacing,
            row_width: scenario.layout().row_width,
            nodes,
        })
    }

    pub fn get(&self, id: ParticipantId) -> Option<&NodeInfo> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Write the registry as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Human-readable table, one line per participant
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.nodes.len() + 1);
        lines.push(format!(
            "{:<5} {:<13} {:<22} {:>10}  {}",
            "id", "role", "global address", "to AP (m)", "uplink"
        ));
        for node in &self.nodes {
            let address = node
                .global
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "-".to_string());
            let distance = node
                .distance_to_access_point
                .map(|d| format!("{:.2}", d))
                .unwrap_or_else(|| "-".to_string());
            let uplink = match node.uplink_in_range {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            };
            lines.push(format!(
                "{:<5} {:<13} {:<22} {:>10}  {}",
                node.id.to_string(),
                node.role,
                address,
                distance,
                uplink
            ));
        }
        lines
    }
}

fn node_info<M: Mobility + ?Sized>(
    participant: &Participant,
    access_point: Option<&Participant>,
    mobility: &M,
) -> NodeInfo {
    let distance = match access_point {
        Some(ap) if !participant.role.is_access_point() => mobility.distance(participant.handle, ap.handle),
        _ => None,
    };
    let uplink = distance.and_then(|d| participant.radius_class.as_ref().map(|class| class.reaches(d)));
    let downlink = distance.and_then(|d| {
        access_point
            .and_then(|ap| ap.radius_class.as_ref())
            .map(|class| class.reaches(d))
    });

    NodeInfo {
        id: participant.id,
        role: participant.role.as_str(),
        position: participant.position,
        radius_class: participant.radius_class.as_ref().map(|class| class.name.clone()),
        range_m: participant.radius_class.as_ref().map(|class| class.range_m),
        link_local: participant.addresses.map(|addrs| addrs.link_local),
        global: participant.global_address(),
        distance_to_access_point: distance,
        uplink_in_range: uplink,
        downlink_in_range: downlink,
    }
}
