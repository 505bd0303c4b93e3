//! # wpansim - Scenario builder for LR-WPAN/6LoWPAN ping simulations
//!
//! This library builds reproducible IEEE 802.15.4 simulation scenarios: an
//! access point and a grid of ordinary nodes on one PAN, addressed over
//! 6LoWPAN, exchanging ICMPv6 echo probes. The simulation itself runs in an
//! external discrete-event engine; the library configures it through a set
//! of substrate traits.
//!
//! ## Overview
//!
//! A scenario moves through four phases, each of which depends on the
//! previous one:
//!
//! ```text
//! Built -> Addressed -> Scheduled -> Completed
//! ```
//!
//! Probes are scheduled against resolved addresses only, so a probe can
//! never target a participant whose address is not known yet.
//!
//! ## Key Features
//!
//! - **Density Layouts**: grid spacing derived from a target area, always
//!   kept inside the bounding square
//! - **Asymmetric Reachability**: the access point reaches every node while
//!   nodes may not reach each other
//! - **Staggered Probes**: all-pairs, single-pair or no probe traffic
//! - **Reproducible**: building the same configuration twice yields the same
//!   layout, radius classes and probe set
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe scenario configuration and validation
//! - `config_loader`: Configuration file loading and CLI overrides
//! - `presets`: Named scenario variants
//! - `layout`: Grid layout planning
//! - `radio`: Radius classes and reachability assignment
//! - `topology`: Participants and the topology builder
//! - `probe`: Probe policies and the probe scheduler
//! - `scenario`: Scenario state, phases and errors
//! - `substrate`: Simulation substrate traits and the plan-recording backend
//! - `registry`: Per-participant diagnostics
//! - `orchestrator`: High-level scenario driver
//! - `utils`: Utility functions and helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wpansim::{config_loader, orchestrator};
//!
//! // Load configuration from YAML file
//! let config = config_loader::load_config(Path::new("scenario.yaml"))?;
//!
//! // Build the scenario and write its plan
//! let outcome = orchestrator::generate_scenario(&config, Path::new("wpansim_output"))?;
//!
//! // The wpansim_output directory now contains:
//! // - scenario_plan.yaml: plan for the simulation engine
//! // - participants.json: per-participant addresses and distances
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! Every section is optional and falls back to its defaults:
//!
//! ```yaml
//! general:
//!   stop_time: 100s
//!   diagnostics: true
//!
//! network:
//!   node_count: 5
//!   access_point: true
//!   pan_id: 0
//!   prefix: "2020:1::"
//!   prefix_len: 64
//!
//! layout:
//!   area_m2: 40000
//!   grid_side_m: 200
//!   spacing:
//!     mode: density
//!
//! radio:
//!   access_point: { name: ap-200m, tx_power_dbm: 9.0, channel: 11, range_m: 200.0 }
//!   node: { name: node-50m, tx_power_dbm: -10.0, channel: 11, range_m: 50.0 }
//!
//! probes:
//!   policy: all_pairs
//!   payload_size: 16
//!   max_packets: 3
//!
//! tracing:
//!   ascii: lr-wpan.tr
//! ```
//!
//! ## Error Handling
//!
//! Library modules return typed `thiserror` errors. Configuration errors are
//! detected before simulated time advances; substrate failures are passed
//! through unchanged. The binary reports both through `color_eyre`.

pub mod config;
pub mod config_loader;
pub mod layout;
pub mod orchestrator;
pub mod presets;
pub mod probe;
pub mod radio;
pub mod registry;
pub mod scenario;
pub mod substrate;
pub mod topology;
pub mod utils;
