//! Scenario state and phase ordering.
//!
//! A scenario moves strictly forward through four phases:
//!
//! ```text
//! Built -> Addressed -> Scheduled -> Completed
//! ```
//!
//! Every transition checks the current phase, so probes can never be
//! scheduled against addresses that do not exist yet and a completed
//! scenario can never be mutated again.

use std::fmt;
use std::net::Ipv6Addr;
use std::time::Duration;

use log::{info, warn};

use crate::config::ValidationError;
use crate::layout::{GridPlan, LayoutError};
use crate::probe::ProbeTask;
use crate::radio::ReachabilityError;
use crate::substrate::{Addressing, Engine, Ipv6Prefix, RunReport, SubstrateError, RADIO_INTERFACE};
use crate::topology::{ParticipantId, Topology};

/// Lifecycle phase of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Participants exist, are placed and carry a radius class
    Built,
    /// Addresses have been assigned and read back
    Addressed,
    /// Probe tasks are installed
    Scheduled,
    /// The engine ran until the stop time
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Built => "built",
            Phase::Addressed => "addressed",
            Phase::Scheduled => "scheduled",
            Phase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Scenario build and run errors. Every variant except `Substrate` is a
/// configuration error detected before simulated time advances.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid scenario configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("layout planning failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("reachability assignment failed: {0}")]
    Reachability(#[from] ReachabilityError),
    #[error("substrate created {created} participants, expected {expected}")]
    ParticipantCount { expected: usize, created: usize },
    #[error("participant {participant} has no radio attachment: {source}")]
    MissingRadio {
        participant: ParticipantId,
        #[source]
        source: SubstrateError,
    },
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),
    #[error("probe {from} -> {to} cannot be scheduled: destination address is not resolved")]
    UnresolvedAddress { from: ParticipantId, to: ParticipantId },
    #[error("probe {from} -> {to} starts at {start:?}, not before its stop at {stop:?}")]
    InvalidProbeWindow {
        from: ParticipantId,
        to: ParticipantId,
        start: Duration,
        stop: Duration,
    },
    #[error("probe timing of {source_id} does not fit in simulated time")]
    ProbeTimeOverflow { source_id: ParticipantId },
    #[error("cannot {operation} while the scenario is {phase}")]
    PhaseOrder { operation: &'static str, phase: Phase },
    #[error("simulation substrate failed to {step}: {source}")]
    Substrate {
        step: &'static str,
        #[source]
        source: SubstrateError,
    },
}

impl ScenarioError {
    /// Whether the error was caused by the scenario configuration rather
    /// than by the substrate
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ScenarioError::Substrate { .. })
    }

    pub(crate) fn substrate(step: &'static str) -> impl FnOnce(SubstrateError) -> ScenarioError {
        move |source| ScenarioError::Substrate { step, source }
    }
}

/// A built scenario: participants, layout and probe tasks
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    layout: GridPlan,
    topology: Topology,
    probes: Vec<ProbeTask>,
    stop_time: Duration,
    phase: Phase,
}

impl Scenario {
    pub(crate) fn built(layout: GridPlan, topology: Topology, stop_time: Duration) -> Self {
        Self {
            layout,
            topology,
            probes: Vec::new(),
            stop_time,
            phase: Phase::Built,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn layout(&self) -> &GridPlan {
        &self.layout
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn probes(&self) -> &[ProbeTask] {
        &self.probes
    }

    pub fn stop_time(&self) -> Duration {
        self.stop_time
    }

    pub(crate) fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<(), ScenarioError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ScenarioError::PhaseOrder {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Global address of a participant, available once addresses are assigned
    pub fn resolve_address(&self, from: ParticipantId, to: ParticipantId) -> Result<Ipv6Addr, ScenarioError> {
        let participant = self.topology.get(to).ok_or(ScenarioError::UnknownParticipant(to))?;
        participant
            .global_address()
            .ok_or(ScenarioError::UnresolvedAddress { from, to })
    }

    /// Assign addresses under `prefix` and read them back for every
    /// participant. `Built -> Addressed`.
    pub fn assign_addresses<A: Addressing + ?Sized>(
        &mut self,
        addressing: &mut A,
        prefix: &Ipv6Prefix,
    ) -> Result<(), ScenarioError> {
        self.expect_phase(Phase::Built, "assign addresses")?;
        addressing
            .assign_addresses(&self.topology.handles(), prefix)
            .map_err(ScenarioError::substrate("assign addresses"))?;

        for participant in self.topology.iter_mut() {
            participant.addresses = addressing.addresses(participant.handle, RADIO_INTERFACE);
            if participant.global_address().is_none() {
                warn!("{} has no global address after assignment", participant.id);
            }
        }
        info!("Assigned addresses under {} to {} participants", prefix, self.topology.len());
        self.phase = Phase::Addressed;
        Ok(())
    }

    /// Record installed probe tasks. `Addressed -> Scheduled`.
    pub(crate) fn mark_scheduled(&mut self, probes: Vec<ProbeTask>) -> Result<(), ScenarioError> {
        self.expect_phase(Phase::Addressed, "schedule probes")?;
        self.probes = probes;
        self.phase = Phase::Scheduled;
        Ok(())
    }

    /// Run the engine until the stop time. `Scheduled -> Completed`.
    pub fn run<E: Engine + ?Sized>(&mut self, engine: &mut E) -> Result<RunReport, ScenarioError> {
        self.expect_phase(Phase::Scheduled, "run the simulation")?;
        info!("Running simulation until {:?}", self.stop_time);
        let report = engine
            .run_until(self.stop_time)
            .map_err(ScenarioError::substrate("run the simulation"))?;
        self.phase = Phase::Completed;
        Ok(report)
    }
}
