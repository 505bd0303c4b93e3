//! Named scenario variants.
//!
//! Every preset is a complete [`ScenarioConfig`]; the variants differ only in
//! their spacing mode, probe policy and whether diagnostics are printed.

use clap::ValueEnum;

use crate::config::ScenarioConfig;
use crate::layout::SpacingMode;
use crate::probe::{ProbePolicy, SinglePairProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Density grid, every node probes every other participant
    AllPairs,
    /// Density grid, one probe from node 1 to the access point
    SinglePair,
    /// 10 m spacing, 5 nodes per row, no probes
    FixedGrid,
    /// Density grid, no probes and no diagnostics
    Idle,
}

impl Preset {
    pub fn config(self) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        match self {
            Preset::AllPairs => {}
            Preset::SinglePair => {
                config.probes = ProbePolicy::SinglePair(SinglePairProbe::default());
            }
            Preset::FixedGrid => {
                config.layout.spacing = SpacingMode::Fixed {
                    spacing: 10,
                    row_width: 5,
                };
                config.probes = ProbePolicy::None;
            }
            Preset::Idle => {
                config.probes = ProbePolicy::None;
                config.general.diagnostics = false;
            }
        }
        config
    }
}
