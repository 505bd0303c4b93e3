//! Probe task and probe policy definitions.

use std::net::Ipv6Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioError;
use crate::substrate::NodeHandle;
use crate::topology::ParticipantId;

/// One scheduled echo request/response exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeTask {
    pub source: ParticipantId,
    pub source_node: NodeHandle,
    pub destination: ParticipantId,
    pub destination_address: Ipv6Addr,
    /// Echo payload in bytes
    pub payload_size: u32,
    pub max_packets: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

impl ProbeTask {
    pub(crate) fn checked(self) -> Result<Self, ScenarioError> {
        if self.start < self.stop {
            Ok(self)
        } else {
            Err(ScenarioError::InvalidProbeWindow {
                from: self.source,
                to: self.destination,
                start: self.start,
                stop: self.stop,
            })
        }
    }
}

/// Every ordinary node probes every other participant once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllPairsProbes {
    pub payload_size: u32,
    /// Packets sent per task
    pub max_packets: u32,
    /// Start of the first source's slot
    #[serde(with = "humantime_serde")]
    pub first_start: Duration,
    /// Offset between consecutive source slots
    #[serde(with = "humantime_serde")]
    pub stagger: Duration,
    /// Time between packets of one task; defaults to one second per node
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,
}

impl Default for AllPairsProbes {
    fn default() -> Self {
        Self {
            payload_size: 16,
            max_packets: 3,
            first_start: Duration::from_secs(1),
            stagger: Duration::from_secs(1),
            interval: None,
        }
    }
}

impl AllPairsProbes {
    pub fn validate(&self) -> Result<(), String> {
        if self.payload_size == 0 {
            return Err("all_pairs payload_size must be at least 1 byte".to_string());
        }
        if self.max_packets == 0 {
            return Err("all_pairs max_packets must be at least 1".to_string());
        }
        if self.stagger < Duration::from_millis(1) {
            return Err("all_pairs stagger must be at least 1ms".to_string());
        }
        if self.interval == Some(Duration::ZERO) {
            return Err("all_pairs interval cannot be zero".to_string());
        }
        Ok(())
    }
}

/// Exactly one probe between two designated participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglePairProbe {
    pub source: ParticipantId,
    pub destination: ParticipantId,
    pub payload_size: u32,
    pub max_packets: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

impl Default for SinglePairProbe {
    fn default() -> Self {
        Self {
            source: ParticipantId(1),
            destination: ParticipantId::ACCESS_POINT,
            payload_size: 19,
            max_packets: 1,
            interval: Duration::from_secs(1),
            start: Duration::from_secs(2),
            stop: Duration::from_secs(10),
        }
    }
}

impl SinglePairProbe {
    pub fn validate(&self, node_count: usize, access_point: bool) -> Result<(), String> {
        let known = |id: ParticipantId| {
            if id == ParticipantId::ACCESS_POINT {
                access_point
            } else {
                (id.0 as usize) <= node_count
            }
        };
        if !known(self.source) {
            return Err(format!("single_pair source {} does not exist", self.source));
        }
        if !known(self.destination) {
            return Err(format!("single_pair destination {} does not exist", self.destination));
        }
        if self.source == self.destination {
            return Err(format!("single_pair source and destination are both {}", self.source));
        }
        if self.start >= self.stop {
            return Err(format!(
                "single_pair start {:?} must be before stop {:?}",
                self.start, self.stop
            ));
        }
        if self.payload_size == 0 || self.max_packets == 0 {
            return Err("single_pair payload_size and max_packets must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Which participant pairs exchange probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ProbePolicy {
    AllPairs(AllPairsProbes),
    SinglePair(SinglePairProbe),
    None,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        ProbePolicy::AllPairs(AllPairsProbes::default())
    }
}

impl ProbePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ProbePolicy::AllPairs(_) => "all_pairs",
            ProbePolicy::SinglePair(_) => "single_pair",
            ProbePolicy::None => "none",
        }
    }

    pub fn validate(&self, node_count: usize, access_point: bool) -> Result<(), String> {
        match self {
            ProbePolicy::AllPairs(params) => params.validate(),
            ProbePolicy::SinglePair(params) => params.validate(node_count, access_point),
            ProbePolicy::None => Ok(()),
        }
    }
}
