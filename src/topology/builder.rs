//! Topology construction.
//!
//! Creates the access point and the ordinary nodes on the substrate,
//! associates all of them to one PAN, places them on the planned grid and
//! attaches their radius classes. The result is a scenario in the `Built`
//! phase, ready for address assignment.

use std::time::Duration;

use log::info;

use super::types::{Participant, ParticipantId, Role, Topology};
use crate::layout::{GridPlan, LayoutError, Position};
use crate::radio::{assign_reachability, ReachabilityProfile};
use crate::scenario::{Scenario, ScenarioError};
use crate::substrate::{Mobility, Substrate};

/// Builder for the participant set of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyBuilder {
    node_count: usize,
    access_point: bool,
    pan_id: u16,
}

impl TopologyBuilder {
    /// `node_count` ordinary nodes plus an access point on PAN 0
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            access_point: true,
            pan_id: 0,
        }
    }

    pub fn with_access_point(mut self, access_point: bool) -> Self {
        self.access_point = access_point;
        self
    }

    pub fn pan_id(mut self, pan_id: u16) -> Self {
        self.pan_id = pan_id;
        self
    }

    /// Create, associate, place and power every participant.
    ///
    /// The access point is always created first, so it holds the first
    /// substrate handle and participant id 0.
    pub fn build<S: Substrate + ?Sized>(
        &self,
        substrate: &mut S,
        layout: &GridPlan,
        access_point_position: Position,
        reachability: &ReachabilityProfile,
        stop_time: Duration,
    ) -> Result<Scenario, ScenarioError> {
        if self.node_count == 0 {
            return Err(LayoutError::NoNodes.into());
        }
        if !layout.fits(self.node_count) {
            return Err(LayoutError::DoesNotFit {
                node_count: self.node_count,
                spacing: layout.spacing,
                row_width: layout.row_width,
                grid_side: layout.grid_side,
            }
            .into());
        }

        let expected = self.node_count + usize::from(self.access_point);
        let handles = substrate
            .create_participants(expected)
            .map_err(ScenarioError::substrate("create participants"))?;
        if handles.len() != expected {
            return Err(ScenarioError::ParticipantCount {
                expected,
                created: handles.len(),
            });
        }

        let mut handles = handles.into_iter();
        let access_point = if self.access_point {
            handles
                .next()
                .map(|handle| Participant::new(ParticipantId::ACCESS_POINT, Role::AccessPoint, handle))
        } else {
            None
        };
        let nodes = handles
            .enumerate()
            .map(|(index, handle)| Participant::new(ParticipantId::node(index), Role::OrdinaryNode { index }, handle))
            .collect();
        let mut topology = Topology::new(self.pan_id, access_point, nodes);

        substrate
            .associate_to_pan(&topology.handles(), self.pan_id)
            .map_err(ScenarioError::substrate("associate to PAN"))?;

        place_participants(substrate, &mut topology, layout, access_point_position)?;
        assign_reachability(substrate, &mut topology, reachability)?;

        info!(
            "Built topology: {} nodes{} on PAN {}",
            self.node_count,
            if self.access_point { " + access point" } else { "" },
            self.pan_id
        );
        Ok(Scenario::built(*layout, topology, stop_time))
    }
}

fn place_participants<M: Mobility + ?Sized>(
    mobility: &mut M,
    topology: &mut Topology,
    layout: &GridPlan,
    access_point_position: Position,
) -> Result<(), ScenarioError> {
    let node_count = topology.nodes().len();
    let mut grid = layout.positions(node_count).into_iter();
    for participant in topology.iter_mut() {
        let position = match participant.role {
            Role::AccessPoint => access_point_position,
            Role::OrdinaryNode { .. } => grid.next().ok_or(LayoutError::DoesNotFit {
                node_count,
                spacing: layout.spacing,
                row_width: layout.row_width,
                grid_side: layout.grid_side,
            })?,
        };
        mobility
            .set_position(participant.handle, position)
            .map_err(ScenarioError::substrate("set position"))?;
        participant.position = Some(position);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan_grid, SpacingMode};
    use crate::scenario::Phase;
    use crate::substrate::{NodeHandle, PlanBackend};

    fn build(node_count: usize, access_point: bool) -> (PlanBackend, Scenario) {
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

    #[test]
    fn test_access_point_created_first() {
        let (backend, scenario) = build(5, true);
        assert_eq!(scenario.phase(), Phase::Built);

        let topology = scenario.topology();
        assert_eq!(topology.len(), 6);
        let ap = topology.access_point().unwrap();
        assert_eq!(ap.handle, NodeHandle(0));
        assert_eq!(ap.position, Some(Position::new(100.0, 100.0)));
        assert_eq!(topology.nodes()[0].handle, NodeHandle(1));
        assert_eq!(topology.nodes()[4].position, Some(Position::new(90.0, 90.0)));

        // Every participant is placed and powered before addressing
        for participant in topology.iter() {
            assert!(participant.position.is_some());
            assert!(participant.radius_class.is_some());
            assert!(participant.addresses.is_none());
        }
        assert_eq!(backend.plan().general.pan_id, Some(0));
        assert!(backend.plan().nodes.values().all(|n| n.pan_id == Some(0)));
    }

    #[test]
    fn test_without_access_point() {
        let (backend, scenario) = build(3, false);
        assert!(scenario.topology().access_point().is_none());
        assert_eq!(scenario.topology().nodes()[0].id, ParticipantId(1));
        assert_eq!(backend.plan().nodes.len(), 3);
    }

    #[test]
    fn test_custom_pan() {
        let mut backend = PlanBackend::new();
        let layout = plan_grid(2, 40_000.0, 200, &SpacingMode::Density).unwrap();
        let scenario = TopologyBuilder::new(2)
            .pan_id(7)
            .build(&mut backend, &layout, layout.center(), &ReachabilityProfile::default(), Duration::from_secs(10))
            .unwrap();
        assert_eq!(scenario.topology().pan_id, 7);
        assert_eq!(backend.plan().general.pan_id, Some(7));
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let mut backend = PlanBackend::new();
        let layout = plan_grid(1, 40_000.0, 200, &SpacingMode::Density).unwrap();
        let err = TopologyBuilder::new(0)
            .build(&mut backend, &layout, layout.center(), &ReachabilityProfile::default(), Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Layout(LayoutError::NoNodes)));
        assert!(backend.plan().nodes.is_empty());
    }

    #[test]
    fn test_layout_too_small_rejected() {
        let mut backend = PlanBackend::new();
        let layout = plan_grid(1, 40_000.0, 200, &SpacingMode::Density).unwrap();
        let err = TopologyBuilder::new(4)
            .build(&mut backend, &layout, layout.center(), &ReachabilityProfile::default(), Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Layout(LayoutError::DoesNotFit { .. })));
        assert!(err.is_configuration_error());
    }
}
