//! Probe scheduling.
//!
//! For the all-pairs policy each ordinary node gets a time slot of its own:
//!
//! ```text
//! slot(i)      = first_start + i * stagger
//! start(i, k)  = slot(i) + k * stagger / destinations
//! stop(i, k)   = start(i, k) + interval * (max_packets - 1) + 1s
//! ```
//!
//! where `i` is the source ordinal and `k` the ordinal of the destination
//! among the other participants, in ascending id order. Tasks are
//! installed by ascending source, then ascending destination.

use std::time::Duration;

use log::{debug, info, warn};

use super::types::{AllPairsProbes, ProbePolicy, ProbeTask, SinglePairProbe};
use crate::scenario::{Phase, Scenario, ScenarioError};
use crate::substrate::Engine;
use crate::topology::Participant;

/// Slack after the last packet before a task stops
pub const STOP_MARGIN: Duration = Duration::from_secs(1);

/// Compute the probe tasks `policy` asks for without installing them.
///
/// Fails with [`ScenarioError::UnresolvedAddress`] if a destination has no
/// address yet.
pub fn plan_probes(policy: &ProbePolicy, scenario: &Scenario) -> Result<Vec<ProbeTask>, ScenarioError> {
    match policy {
        ProbePolicy::AllPairs(params) => plan_all_pairs(params, scenario),
        ProbePolicy::SinglePair(params) => plan_single_pair(params, scenario).map(|task| vec![task]),
        ProbePolicy::None => Ok(Vec::new()),
    }
}

fn plan_all_pairs(params: &AllPairsProbes, scenario: &Scenario) -> Result<Vec<ProbeTask>, ScenarioError> {
    let topology = scenario.topology();
    let sources = topology.nodes();
    let interval = params
        .interval
        .unwrap_or_else(|| Duration::from_secs(sources.len() as u64));
    let active_time = interval
        .checked_mul(params.max_packets.saturating_sub(1))
        .and_then(|busy| busy.checked_add(STOP_MARGIN));

    let mut tasks = Vec::with_capacity(sources.len() * topology.len().saturating_sub(1));
    for (ordinal, source) in sources.iter().enumerate() {
        let destinations: Vec<&Participant> = topology.iter().filter(|p| p.id != source.id).collect();
        if destinations.is_empty() {
            warn!("{} has no other participant to probe", source.id);
            continue;
        }

        let overflow = || ScenarioError::ProbeTimeOverflow { source_id: source.id };
        let active_time = active_time.ok_or_else(overflow)?;
        let slot = u32::try_from(ordinal)
            .ok()
            .and_then(|ordinal| params.stagger.checked_mul(ordinal))
            .and_then(|delay| params.first_start.checked_add(delay))
            .ok_or_else(overflow)?;
        let offset = params.stagger / destinations.len() as u32;
        debug!("{} probes {} destinations from {:?}", source.id, destinations.len(), slot);

        for (k, destination) in destinations.into_iter().enumerate() {
            let start = slot_start(slot, offset, k).ok_or_else(overflow)?;
            let stop = start.checked_add(active_time).ok_or_else(overflow)?;
            let task = ProbeTask {
                source: source.id,
                source_node: source.handle,
                destination: destination.id,
                destination_address: scenario.resolve_address(source.id, destination.id)?,
                payload_size: params.payload_size,
                max_packets: params.max_packets,
                interval,
                start,
                stop,
            };
            tasks.push(task.checked()?);
        }
    }
    Ok(tasks)
}

fn slot_start(slot: Duration, offset: Duration, k: usize) -> Option<Duration> {
    let k = u32::try_from(k).ok()?;
    slot.checked_add(offset.checked_mul(k)?)
}

fn plan_single_pair(params: &SinglePairProbe, scenario: &Scenario) -> Result<ProbeTask, ScenarioError> {
    let source = scenario
        .topology()
        .get(params.source)
        .ok_or(ScenarioError::UnknownParticipant(params.source))?;
    let task = ProbeTask {
        source: source.id,
        source_node: source.handle,
        destination: params.destination,
        destination_address: scenario.resolve_address(source.id, params.destination)?,
        payload_size: params.payload_size,
        max_packets: params.max_packets,
        interval: params.interval,
        start: params.start,
        stop: params.stop,
    };
    task.checked()
}

/// Plan the probes for `policy` and install them on their sources.
/// `Addressed -> Scheduled`.
///
/// # Returns
/// The number of installed tasks
pub fn schedule_probes<E: Engine + ?Sized>(
    scenario: &mut Scenario,
    policy: &ProbePolicy,
    engine: &mut E,
) -> Result<usize, ScenarioError> {
    scenario.expect_phase(Phase::Addressed, "schedule probes")?;
    let tasks = plan_probes(policy, scenario)?;

    let stop_time = scenario.stop_time();
    for task in &tasks {
        if task.stop > stop_time {
            warn!(
                "Probe {} -> {} stops at {:?}, after the simulation stop time {:?}",
                task.source, task.destination, task.stop, stop_time
            );
        }
        engine
            .install_probe(task)
            .map_err(ScenarioError::substrate("install probe"))?;
    }

    let count = tasks.len();
    scenario.mark_scheduled(tasks)?;
    info!("Scheduled {} probe tasks ({} policy)", count, policy.name());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan_grid, SpacingMode};
    use crate::radio::ReachabilityProfile;
    use crate::substrate::{Ipv6Prefix, PlanBackend};
    use crate::topology::{ParticipantId, TopologyBuilder};
    use std::collections::HashSet;

    fn built(node_count: usize, access_point: bool) -> (PlanBackend, Scenario) {
        let mut backend = PlanBackend::new();
        let layout = plan_grid(node_count, 40_000.0, 200, &SpacingMode::Density).unwrap();
        let scenario = TopologyBuilder::new(node_count)
            .with_access_point(access_point)
            .build(
                &mut backend,
                &layout,
                layout.center(),
                &ReachabilityProfile::default(),
                Duration::from_secs(100),
            )
            .unwrap();
        (backend, scenario)
    }

    fn addressed(node_count: usize) -> (PlanBackend, Scenario) {
        let (mut backend, mut scenario) = built(node_count, true);
        scenario.assign_addresses(&mut backend, &Ipv6Prefix::default()).unwrap();
        (backend, scenario)
    }

    #[test]
    fn test_all_pairs_counts_and_order() {
        for n in 1..=8 {
            let (_, scenario) = addressed(n);
            let tasks = plan_probes(&ProbePolicy::default(), &scenario).unwrap();
            assert_eq!(tasks.len(), n * n, "n={}", n);

            let pairs: HashSet<(u32, u32)> = tasks.iter().map(|t| (t.source.0, t.destination.0)).collect();
            assert_eq!(pairs.len(), n * n);
            assert!(tasks.iter().all(|t| t.source != t.destination));
            assert!(tasks.iter().all(|t| t.source != ParticipantId::ACCESS_POINT));

            let order: Vec<(u32, u32)> = tasks.iter().map(|t| (t.source.0, t.destination.0)).collect();
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(order, sorted);
        }
    }

    #[test]
    fn test_all_pairs_start_times_distinct_per_source() {
        let (_, scenario) = addressed(6);
        let tasks = plan_probes(&ProbePolicy::default(), &scenario).unwrap();
        for source in 1..=6 {
            let starts: Vec<Duration> = tasks
                .iter()
                .filter(|t| t.source == ParticipantId(source))
                .map(|t| t.start)
                .collect();
            let unique: HashSet<Duration> = starts.iter().copied().collect();
            assert_eq!(unique.len(), starts.len(), "source {}", source);

            // The last start of a slot stays before the next source's slot
            let next_slot = Duration::from_secs(1) + Duration::from_secs(1) * source;
            assert!(starts.iter().all(|start| *start < next_slot), "source {}", source);
        }
        assert!(tasks.iter().all(|t| t.start < t.stop));
    }

    #[test]
    fn test_all_pairs_timing() {
        let (_, scenario) = addressed(5);
        let tasks = plan_probes(&ProbePolicy::default(), &scenario).unwrap();

        // First node, first destination (the access point)
        let first = &tasks[0];
        assert_eq!(first.source, ParticipantId(1));
        assert_eq!(first.destination, ParticipantId::ACCESS_POINT);
        assert_eq!(first.start, Duration::from_secs(1));
        assert_eq!(first.interval, Duration::from_secs(5));
        // 3 packets at 5 s intervals plus one second of slack
        assert_eq!(first.stop, Duration::from_secs(12));
        assert_eq!(first.payload_size, 16);
        assert_eq!(first.max_packets, 3);
        assert_eq!(first.destination_address, "2020:1::ff:fe00:1".parse::<std::net::Ipv6Addr>().unwrap());

        // Third node's slot starts two seconds later, destinations 200 ms apart
        let third: Vec<&ProbeTask> = tasks.iter().filter(|t| t.source == ParticipantId(3)).collect();
        assert_eq!(third[0].start, Duration::from_secs(3));
        assert_eq!(third[1].start, Duration::from_millis(3200));
        assert_eq!(third[4].start, Duration::from_millis(3800));
    }

    #[test]
    fn test_all_pairs_time_overflow_is_a_configuration_error() {
        let (_, scenario) = addressed(3);
        let policy = ProbePolicy::AllPairs(AllPairsProbes {
            max_packets: 4_000_000_000,
            interval: Some(Duration::from_secs(100_000_000_000)),
            ..AllPairsProbes::default()
        });
        let err = plan_probes(&policy, &scenario).unwrap_err();
        assert!(matches!(err, ScenarioError::ProbeTimeOverflow { source_id: ParticipantId(1) }));
        assert!(err.is_configuration_error());

        let policy = ProbePolicy::AllPairs(AllPairsProbes {
            first_start: Duration::MAX,
            ..AllPairsProbes::default()
        });
        assert!(matches!(
            plan_probes(&policy, &scenario),
            Err(ScenarioError::ProbeTimeOverflow { .. })
        ));
    }

    #[test]
    fn test_all_pairs_without_access_point() {
        let (mut backend, mut scenario) = built(3, false);
        scenario.assign_addresses(&mut backend, &Ipv6Prefix::default()).unwrap();
        let tasks = plan_probes(&ProbePolicy::default(), &scenario).unwrap();
        assert_eq!(tasks.len(), 3 * 2);
    }

    #[test]
    fn test_single_pair() {
        let (_, scenario) = addressed(5);
        let policy = ProbePolicy::SinglePair(SinglePairProbe::default());
        let tasks = plan_probes(&policy, &scenario).unwrap();
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        assert_eq!(task.source, ParticipantId(1));
        assert_eq!(task.destination, ParticipantId::ACCESS_POINT);
        assert_eq!(task.payload_size, 19);
        assert_eq!(task.max_packets, 1);
        assert_eq!(task.start, Duration::from_secs(2));
        assert_eq!(task.stop, Duration::from_secs(10));
    }

    #[test]
    fn test_single_pair_unknown_source() {
        let (_, scenario) = addressed(2);
        let policy = ProbePolicy::SinglePair(SinglePairProbe {
            source: ParticipantId(9),
            ..SinglePairProbe::default()
        });
        assert!(matches!(
            plan_probes(&policy, &scenario),
            Err(ScenarioError::UnknownParticipant(ParticipantId(9)))
        ));
    }

    #[test]
    fn test_none_policy() {
        let (mut backend, mut scenario) = addressed(4);
        assert_eq!(schedule_probes(&mut scenario, &ProbePolicy::None, &mut backend).unwrap(), 0);
        assert_eq!(scenario.phase(), Phase::Scheduled);
        assert!(backend.plan().probes.is_empty());
    }

    #[test]
    fn test_planning_before_addressing_fails() {
        let (_, scenario) = built(3, true);
        let err = plan_probes(&ProbePolicy::default(), &scenario).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::UnresolvedAddress { from: ParticipantId(1), to: ParticipantId(0) }
        ));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_scheduling_before_addressing_fails() {
        let (mut backend, mut scenario) = built(3, true);
        let err = schedule_probes(&mut scenario, &ProbePolicy::default(), &mut backend).unwrap_err();
        assert!(matches!(err, ScenarioError::PhaseOrder { phase: Phase::Built, .. }));
        assert!(err.is_configuration_error());
        assert!(backend.plan().probes.is_empty());
        assert_eq!(scenario.phase(), Phase::Built);
    }

    #[test]
    fn test_schedule_installs_in_order() {
        let (mut backend, mut scenario) = addressed(3);
        let count = schedule_probes(&mut scenario, &ProbePolicy::default(), &mut backend).unwrap();
        assert_eq!(count, 9);
        assert_eq!(backend.plan().probes, scenario.probes());

        // Scheduling twice is a phase violation
        assert!(matches!(
            schedule_probes(&mut scenario, &ProbePolicy::default(), &mut backend),
            Err(ScenarioError::PhaseOrder { phase: Phase::Scheduled, .. })
        ));
    }
}
