//! Probe traffic: which participant pairs exchange echo requests, and when.

pub mod scheduler;
pub mod types;

pub use scheduler::{plan_probes, schedule_probes, STOP_MARGIN};
pub use types::{AllPairsProbes, ProbePolicy, ProbeTask, SinglePairProbe};
