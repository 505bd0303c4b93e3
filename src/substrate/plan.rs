//! Plan-recording substrate backend.
//!
//! [`PlanBackend`] implements every substrate trait by recording the
//! configuration commands it receives. Running the "simulation" hands the
//! recorded plan to the external engine by writing it out as YAML.

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::{Serialize, Serializer};

use super::addressing::{self, Ipv6Prefix, LOOPBACK_INTERFACE, RADIO_INTERFACE};
use super::{
    Addressing, ArtifactRequest, Engine, InterfaceAddresses, Mobility, NodeHandle, Radio, RunReport,
    SubstrateError,
};
use crate::layout::Position;
use crate::probe::ProbeTask;
use crate::radio::TxPowerProfile;

const BROADCAST_SHORT_ADDRESS: u16 = 0xffff;

/// Simulation-wide settings of a plan
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct PlanGeneral {
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Ipv6Prefix>,
    /// Log level the engine should run with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// One participant as the engine should create it
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct PlanNode {
    #[serde(
        serialize_with = "serialize_short_address",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_address: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<TxPowerProfile>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<u32, InterfaceAddresses>,
}

fn serialize_short_address<S: Serializer>(value: &Option<u16>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(short) => serializer.serialize_str(&addressing::format_short_address(*short)),
        None => serializer.serialize_none(),
    }
}

/// Everything recorded for the external engine
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct SimulationPlan {
    pub general: PlanGeneral,
    #[serde(skip_serializing_if = "ArtifactRequest::is_empty")]
    pub artifacts: ArtifactRequest,
    pub nodes: BTreeMap<u32, PlanNode>,
    pub probes: Vec<ProbeTask>,
}

/// Substrate backend that records a [`SimulationPlan`]
#[derive(Debug)]
pub struct PlanBackend {
    plan: SimulationPlan,
    output: Option<PathBuf>,
    next_short_address: u16,
    ran: bool,
    torn_down: bool,
}

impl PlanBackend {
    /// Backend that keeps the plan in memory only
    pub fn new() -> Self {
        Self {
            plan: SimulationPlan::default(),
            output: None,
            next_short_address: 1,
            ran: false,
            torn_down: false,
        }
    }

    /// Backend that writes the plan to `path` when the run is requested
    pub fn with_output(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..Self::new()
        }
    }

    pub fn with_engine_log_level(mut self, level: impl Into<String>) -> Self {
        self.plan.general.log_level = Some(level.into());
        self
    }

    pub fn plan(&self) -> &SimulationPlan {
        &self.plan
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn ensure_live(&self) -> Result<(), SubstrateError> {
        if self.torn_down {
            Err(SubstrateError::TornDown)
        } else {
            Ok(())
        }
    }

    fn node(&self, handle: NodeHandle) -> Result<&PlanNode, SubstrateError> {
        self.plan.nodes.get(&handle.0).ok_or(SubstrateError::UnknownNode(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut PlanNode, SubstrateError> {
        self.ensure_live()?;
        self.plan.nodes.get_mut(&handle.0).ok_or(SubstrateError::UnknownNode(handle))
    }

    fn radio_device(&self, handle: NodeHandle) -> Result<u16, SubstrateError> {
        self.node(handle)?.short_address.ok_or(SubstrateError::NoRadioDevice(handle))
    }
}

impl Default for PlanBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for PlanBackend {
    fn create_participants(&mut self, count: usize) -> Result<Vec<NodeHandle>, SubstrateError> {
        self.ensure_live()?;
        let first = self.plan.nodes.len() as u32;
        let handles: Vec<NodeHandle> = (first..first + count as u32).map(NodeHandle).collect();
        for handle in &handles {
            self.plan.nodes.insert(handle.0, PlanNode::default());
        }
        debug!("Created {} participants starting at {}", count, NodeHandle(first));
        Ok(handles)
    }

    fn associate_to_pan(&mut self, nodes: &[NodeHandle], pan_id: u16) -> Result<(), SubstrateError> {
        self.ensure_live()?;
        for handle in nodes {
            let short_address = self.next_short_address;
            let node = self.node_mut(*handle)?;
            let mut assigned = false;
            if node.short_address.is_none() {
                // 0xffff is the broadcast address
                if short_address == BROADCAST_SHORT_ADDRESS {
                    return Err(SubstrateError::ShortAddressesExhausted(*handle));
                }
                node.short_address = Some(short_address);
                assigned = true;
            }
            node.pan_id = Some(pan_id);
            if assigned {
                self.next_short_address = short_address + 1;
            }
        }
        self.plan.general.pan_id = Some(pan_id);
        debug!("Associated {} participants to PAN {}", nodes.len(), pan_id);
        Ok(())
    }

    fn request_artifacts(&mut self, request: &ArtifactRequest) -> Result<(), SubstrateError> {
        self.ensure_live()?;
        self.plan.artifacts = request.clone();
        Ok(())
    }

    fn install_probe(&mut self, task: &ProbeTask) -> Result<(), SubstrateError> {
        self.ensure_live()?;
        if self.ran {
            return Err(SubstrateError::AlreadyRan);
        }
        self.node(task.source_node)?;
        self.plan.probes.push(task.clone());
        Ok(())
    }

    fn run_until(&mut self, stop_time: Duration) -> Result<RunReport, SubstrateError> {
        self.ensure_live()?;
        if self.ran {
            return Err(SubstrateError::AlreadyRan);
        }
        self.plan.general.stop_time = Some(stop_time);

        if let Some(path) = &self.output {
            let yaml = serde_yaml::to_string(&self.plan)?;
            fs::write(path, yaml)?;
            info!("Wrote simulation plan to {:?}", path);
        }
        self.ran = true;

        Ok(RunReport {
            stop_time,
            probes: self.plan.probes.len(),
            plan_path: self.output.clone(),
        })
    }

    fn teardown(&mut self) {
        if !self.torn_down {
            debug!("Tearing down {} participants", self.plan.nodes.len());
            self.torn_down = true;
        }
    }
}

impl Radio for PlanBackend {
    fn attach_power_profile(&mut self, node: NodeHandle, profile: &TxPowerProfile) -> Result<(), SubstrateError> {
        self.ensure_live()?;
        self.radio_device(node)?;
        self.node_mut(node)?.power = Some(profile.clone());
        Ok(())
    }
}

impl Addressing for PlanBackend {
    fn assign_addresses(&mut self, nodes: &[NodeHandle], prefix: &Ipv6Prefix) -> Result<(), SubstrateError> {
        self.ensure_live()?;
        if !prefix.is_valid() {
            return Err(SubstrateError::InvalidPrefix(*prefix));
        }
        for handle in nodes {
            let short_address = self.radio_device(*handle)?;
            let node = self.node_mut(*handle)?;
            node.interfaces.insert(
                LOOPBACK_INTERFACE,
                InterfaceAddresses {
                    link_local: Ipv6Addr::LOCALHOST,
                    global: None,
                },
            );
            node.interfaces.insert(
                RADIO_INTERFACE,
                InterfaceAddresses {
                    link_local: addressing::link_local(short_address),
                    global: Some(prefix.with_iid(addressing::short_address_iid(short_address))),
                },
            );
        }
        self.plan.general.prefix = Some(*prefix);
        debug!("Assigned addresses under {} to {} participants", prefix, nodes.len());
        Ok(())
    }

    fn addresses(&self, node: NodeHandle, interface: u32) -> Option<InterfaceAddresses> {
        self.plan.nodes.get(&node.0)?.interfaces.get(&interface).copied()
    }
}

impl Mobility for PlanBackend {
    fn set_position(&mut self, node: NodeHandle, position: Position) -> Result<(), SubstrateError> {
        self.node_mut(node)?.position = Some(position);
        Ok(())
    }

    fn distance(&self, a: NodeHandle, b: NodeHandle) -> Option<f64> {
        let a = self.plan.nodes.get(&a.0)?.position?;
        let b = self.plan.nodes.get(&b.0)?.position?;
        Some(a.distance_to(&b))
    }
}
