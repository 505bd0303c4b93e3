use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use std::time::Duration;

use crate::layout::{Position, SpacingMode, DEFAULT_AREA_M2, DEFAULT_GRID_SIDE_M};
use crate::probe::ProbePolicy;
use crate::radio::{RadiusClass, ReachabilityError, ReachabilityProfile};
use crate::substrate::{ArtifactRequest, Ipv6Prefix};

/// Complete description of one scenario variant
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub layout: LayoutConfig,
    pub radio: RadioConfig,
    pub probes: ProbePolicy,
    #[serde(skip_serializing_if = "ArtifactRequest::is_empty")]
    pub tracing: ArtifactRequest,
}

impl ScenarioConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.stop_time.is_zero() {
            return Err(ValidationError::InvalidGeneral(
                "stop_time must be greater than zero".to_string(),
            ));
        }
        if let Some(level) = &self.general.log_level {
            if level.parse::<log::LevelFilter>().is_err() {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log level '{}'",
                    level
                )));
            }
        }

        if self.network.node_count == 0 {
            return Err(ValidationError::InvalidNetwork(
                "node_count must be at least 1".to_string(),
            ));
        }
        // Short addresses are 16 bit, start at 1 and stop short of broadcast
        if self.network.node_count + usize::from(self.network.access_point) >= u16::MAX as usize {
            return Err(ValidationError::InvalidNetwork(format!(
                "{} participants exceed the 16-bit short address space",
                self.network.node_count
            )));
        }
        if !self.prefix().is_valid() {
            return Err(ValidationError::InvalidNetwork(format!(
                "prefix length {} leaves no room for a 64-bit interface identifier",
                self.network.prefix_len
            )));
        }

        if !(self.layout.area_m2.is_finite() && self.layout.area_m2 > 0.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "area_m2 must be positive, got {}",
                self.layout.area_m2
            )));
        }
        if self.layout.grid_side_m == 0 {
            return Err(ValidationError::InvalidLayout(
                "grid_side_m must be at least 1".to_string(),
            ));
        }
        if let SpacingMode::Fixed { spacing, row_width } = self.layout.spacing {
            if spacing == 0 || row_width == 0 {
                return Err(ValidationError::InvalidLayout(format!(
                    "fixed spacing ({}) and row width ({}) must be at least 1",
                    spacing, row_width
                )));
            }
        }
        if !self.network.access_point && self.layout.access_point_position.is_some() {
            return Err(ValidationError::InvalidLayout(
                "access_point_position is set but the access point is disabled".to_string(),
            ));
        }

        self.reachability()
            .map_err(|e| ValidationError::InvalidRadio(e.to_string()))?;

        self.probes
            .validate(self.network.node_count, self.network.access_point)
            .map_err(ValidationError::InvalidProbes)?;

        Ok(())
    }

    /// Global addressing prefix
    pub fn prefix(&self) -> Ipv6Prefix {
        Ipv6Prefix::new(self.network.prefix, self.network.prefix_len)
    }

    /// Role to radius class mapping
    pub fn reachability(&self) -> Result<ReachabilityProfile, ReachabilityError> {
        ReachabilityProfile::new(
            self.radio.access_point.clone(),
            self.radio.node.clone(),
            self.radio.allow_symmetric_range,
        )
    }
}

/// Simulation-wide settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(with = "humantime_serde")]
    pub stop_time: Duration,
    /// Log level forwarded to the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Print the per-node table after the run
    pub diagnostics: bool,
}

/// Participant set and addressing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Number of ordinary nodes
    pub node_count: usize,
    pub access_point: bool,
    pub pan_id: u16,
    pub prefix: Ipv6Addr,
    pub prefix_len: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub area_m2: f64,
    pub grid_side_m: u32,
    pub spacing: SpacingMode,
    /// Defaults to the center of the grid square
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_point_position: Option<Position>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RadioConfig {
    pub access_point: RadiusClass,
    pub node: RadiusClass,
    /// Accept an access point range equal to the node range
    pub allow_symmetric_range: bool,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),
    #[error("Invalid radio configuration: {0}")]
    InvalidRadio(String),
    #[error("Invalid probe configuration: {0}")]
    InvalidProbes(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            stop_time: Duration::from_secs(100),
            log_level: None,
            diagnostics: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let prefix = Ipv6Prefix::default();
        Self {
            node_count: 5,
            access_point: true,
            pan_id: 0,
            prefix: prefix.network,
            prefix_len: prefix.len,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            area_m2: DEFAULT_AREA_M2,
            grid_side_m: DEFAULT_GRID_SIDE_M,
            spacing: SpacingMode::Density,
            access_point_position: None,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            access_point: RadiusClass::access_point_default(),
            node: RadiusClass::node_default(),
            allow_symmetric_range: false,
        }
    }
}
