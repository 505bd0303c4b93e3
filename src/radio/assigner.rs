//! Reachability assignment.
//!
//! The access point always gets the larger radius class and every ordinary
//! node the smaller one. The access point can then hear every node directly
//! while nodes may be out of each other's range once the grid spacing
//! exceeds the node radius.

use log::{debug, info};

use super::profile::RadiusClass;
use crate::scenario::ScenarioError;
use crate::substrate::{Radio, SubstrateError};
use crate::topology::{Role, Topology};

/// Reachability configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReachabilityError {
    #[error("invalid radius class: {0}")]
    InvalidClass(String),
    #[error("access point range ({access_point} m) must exceed node range ({node} m)")]
    NotAsymmetric { access_point: f64, node: f64 },
}

/// Role to radius class mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ReachabilityProfile {
    access_point: RadiusClass,
    node: RadiusClass,
}

impl ReachabilityProfile {
    /// Build a profile. Unless `allow_symmetric` is set, the access point
    /// range must strictly exceed the node range. With it set, equal ranges
    /// are accepted so every participant can share one class.
    pub fn new(
        access_point: RadiusClass,
        node: RadiusClass,
        allow_symmetric: bool,
    ) -> Result<Self, ReachabilityError> {
        access_point.validate().map_err(ReachabilityError::InvalidClass)?;
        node.validate().map_err(ReachabilityError::InvalidClass)?;

        let asymmetric = access_point.range_m > node.range_m;
        let symmetric_ok = allow_symmetric && access_point.range_m == node.range_m;
        if !(asymmetric || symmetric_ok) {
            return Err(ReachabilityError::NotAsymmetric {
                access_point: access_point.range_m,
                node: node.range_m,
            });
        }
        Ok(Self { access_point, node })
    }

    pub fn access_point(&self) -> &RadiusClass {
        &self.access_point
    }

    pub fn node(&self) -> &RadiusClass {
        &self.node
    }

    pub fn class_for(&self, role: &Role) -> &RadiusClass {
        match role {
            Role::AccessPoint => &self.access_point,
            Role::OrdinaryNode { .. } => &self.node,
        }
    }
}

impl Default for ReachabilityProfile {
    fn default() -> Self {
        Self {
            access_point: RadiusClass::access_point_default(),
            node: RadiusClass::node_default(),
        }
    }
}

/// Attach one radius class to every participant of `topology`.
///
/// A participant whose radio device cannot be resolved is a fatal
/// configuration error.
pub fn assign_reachability<R: Radio + ?Sized>(
    radio: &mut R,
    topology: &mut Topology,
    profile: &ReachabilityProfile,
) -> Result<(), ScenarioError> {
    for participant in topology.iter_mut() {
        let class = profile.class_for(&participant.role).clone();
        radio
            .attach_power_profile(participant.handle, &class.power())
            .map_err(|source| match source {
                SubstrateError::UnknownNode(_) | SubstrateError::NoRadioDevice(_) => {
                    ScenarioError::MissingRadio {
                        participant: participant.id,
                        source,
                    }
                }
                other => ScenarioError::Substrate {
                    step: "attach power profile",
                    source: other,
                },
            })?;
        debug!("{} ({}) -> {}", participant.id, participant.role.as_str(), class.name);
        participant.radius_class = Some(class);
    }
    info!(
        "Assigned radius classes: access point '{}' ({} m), nodes '{}' ({} m)",
        profile.access_point.name, profile.access_point.range_m, profile.node.name, profile.node.range_m
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{Engine, NodeHandle, PlanBackend};
    use crate::topology::{Participant, ParticipantId};

    fn topology(backend: &mut PlanBackend, nodes: usize) -> Topology {
        let handles = backend.create_participants(nodes + 1).unwrap();
        let ap = Participant::new(ParticipantId::ACCESS_POINT, Role::AccessPoint, handles[0]);
        let nodes = (0..nodes)
            .map(|i| Participant::new(ParticipantId::node(i), Role::OrdinaryNode { index: i }, handles[i + 1]))
            .collect();
        Topology::new(0, Some(ap), nodes)
    }

    #[test]
    fn test_access_point_gets_larger_class() {
        let mut backend = PlanBackend::new();
        let mut topology = topology(&mut backend, 4);
        backend.associate_to_pan(&topology.handles(), 0).unwrap();

        let profile = ReachabilityProfile::default();
        assign_reachability(&mut backend, &mut topology, &profile).unwrap();

        let ap_range = topology.access_point().unwrap().radius_class.as_ref().unwrap().range_m;
        for node in topology.nodes() {
            let class = node.radius_class.as_ref().unwrap();
            assert_eq!(class.name, "node-50m");
            assert!(ap_range > class.range_m);
        }
        assert_eq!(backend.plan().nodes[&0].power.as_ref().unwrap().tx_power_dbm, 9.0);
        assert_eq!(backend.plan().nodes[&3].power.as_ref().unwrap().tx_power_dbm, -10.0);
    }

    #[test]
    fn test_missing_radio_is_fatal() {
        let mut backend = PlanBackend::new();
        let mut topology = topology(&mut backend, 2);
        // Not associated to a PAN, so no LR-WPAN device exists yet

        let err = assign_reachability(&mut backend, &mut topology, &ReachabilityProfile::default()).unwrap_err();
        match err {
            ScenarioError::MissingRadio { participant, source } => {
                assert_eq!(participant, ParticipantId::ACCESS_POINT);
                assert!(matches!(source, SubstrateError::NoRadioDevice(NodeHandle(0))));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(topology.access_point().unwrap().radius_class.is_none());
    }

    #[test]
    fn test_profile_requires_asymmetry() {
        let ap = RadiusClass::access_point_default();
        let node = RadiusClass::node_default();

        assert!(ReachabilityProfile::new(ap.clone(), node.clone(), false).is_ok());
        assert_eq!(
            ReachabilityProfile::new(node.clone(), ap.clone(), false),
            Err(ReachabilityError::NotAsymmetric { access_point: 50.0, node: 200.0 })
        );
        // Larger node range is never accepted
        assert!(ReachabilityProfile::new(node, ap.clone(), true).is_err());
    }

    #[test]
    fn test_symmetric_override_shares_one_class() {
        let ap = RadiusClass::access_point_default();
        assert!(ReachabilityProfile::new(ap.clone(), ap.clone(), false).is_err());

        let profile = ReachabilityProfile::new(ap.clone(), ap.clone(), true).unwrap();
        assert_eq!(profile.class_for(&Role::OrdinaryNode { index: 0 }), &ap);
    }
}
