//! Radius classes: named transmit power configurations with a nominal range.

use serde::{Deserialize, Serialize};

/// Lowest and highest IEEE 802.15.4 channel in the 2.4 GHz band
pub const CHANNEL_RANGE: std::ops::RangeInclusive<u8> = 11..=26;

/// Parameters the radio layer turns into a transmit power spectral density
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxPowerProfile {
    pub tx_power_dbm: f64,
    pub channel: u8,
}

/// A named power configuration and the line-of-sight range it yields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusClass {
    pub name: String,
    pub tx_power_dbm: f64,
    pub channel: u8,
    /// Nominal communication range in meters
    pub range_m: f64,
}

impl RadiusClass {
    pub fn new(name: impl Into<String>, tx_power_dbm: f64, channel: u8, range_m: f64) -> Self {
        Self {
            name: name.into(),
            tx_power_dbm,
            channel,
            range_m,
        }
    }

    /// 9 dBm on channel 11, about 200 m according to the LR-WPAN
    /// error/distance curves
    pub fn access_point_default() -> Self {
        Self::new("ap-200m", 9.0, 11, 200.0)
    }

    /// -10 dBm on channel 11, about 50 m
    pub fn node_default() -> Self {
        Self::new("node-50m", -10.0, 11, 50.0)
    }

    pub fn power(&self) -> TxPowerProfile {
        TxPowerProfile {
            tx_power_dbm: self.tx_power_dbm,
            channel: self.channel,
        }
    }

    /// Whether a transmitter of this class reaches `distance_m`
    pub fn reaches(&self, distance_m: f64) -> bool {
        distance_m <= self.range_m
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("radius class name cannot be empty".to_string());
        }
        if !CHANNEL_RANGE.contains(&self.channel) {
            return Err(format!(
                "radius class '{}': channel {} outside {}..={}",
                self.name,
                self.channel,
                CHANNEL_RANGE.start(),
                CHANNEL_RANGE.end()
            ));
        }
        if !self.tx_power_dbm.is_finite() {
            return Err(format!("radius class '{}': tx power must be finite", self.name));
        }
        if !(self.range_m.is_finite() && self.range_m > 0.0) {
            return Err(format!(
                "radius class '{}': range must be positive, got {}",
                self.name, self.range_m
            ));
        }
        Ok(())
    }
}
