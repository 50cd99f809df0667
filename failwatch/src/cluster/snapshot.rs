use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::cluster::ClusterView;
use crate::cluster::ControlPlane;
use crate::cluster::Member;
use crate::cluster::NodeId;
use crate::cluster::Role;
use crate::errors::ControlPlaneError;

/// The observed state of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberState {
    pub role: Role,
    pub health: String,

    /// Whether the member was present in the control plane listing.
    pub reachable: bool,
}

impl MemberState {
    pub fn unreachable() -> Self {
        Self {
            role: Role::Unknown,
            health: "unreachable".to_string(),
            reachable: false,
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reachable {
            write!(f, "{}/{}", self.role, self.health)
        } else {
            write!(f, "unreachable")
        }
    }
}

/// A point-in-time mapping of every known member to its observed state.
///
/// Members that are expected but absent from the listing are kept as
/// unreachable entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSnapshot {
    members: BTreeMap<NodeId, MemberState>,
}

impl ClusterSnapshot {
    /// Build a snapshot from what the control plane reported, filling in
    /// `expected` members it did not mention as unreachable.
    pub fn new(expected: &[NodeId], reported: Vec<Member>) -> Self {
        let mut members = BTreeMap::new();

        for id in expected {
            members.insert(id.clone(), MemberState::unreachable());
        }

        for m in reported {
            members.insert(m.name, MemberState {
                role: m.role,
                health: m.state,
                reachable: true,
            });
        }

        Self { members }
    }

    /// Query `control_plane` and build a snapshot, bounded by `timeout`.
    pub async fn query<CP>(
        control_plane: &CP,
        expected: &[NodeId],
        timeout: Duration,
    ) -> Result<Self, ControlPlaneError>
    where
        CP: ControlPlane,
    {
        let res = tokio::time::timeout(timeout, control_plane.members()).await;
        let reported = res.map_err(|_| ControlPlaneError::Timeout(timeout))??;
        Ok(Self::new(expected, reported))
    }

    pub fn members(&self) -> &BTreeMap<NodeId, MemberState> {
        &self.members
    }

    pub fn get(&self, id: &str) -> Option<&MemberState> {
        self.members.get(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members present in the control plane listing.
    pub fn reachable(&self) -> impl Iterator<Item = (&NodeId, &MemberState)> {
        self.members.iter().filter(|(_, s)| s.reachable)
    }

    /// All reachable members reporting the leader role, in id order.
    pub fn leaders(&self) -> Vec<&NodeId> {
        self.reachable()
            .filter(|(_, s)| s.role.is_leader())
            .map(|(id, _)| id)
            .collect()
    }

    /// The first leader in id order.
    pub fn leader(&self) -> Option<&NodeId> {
        self.leaders().into_iter().next()
    }

    /// More than one member claims to be leader.
    pub fn is_split_brain(&self) -> bool {
        self.leaders().len() > 1
    }

    /// No reachable member is leader while more than one member reports.
    ///
    /// A single reporting member is not enough evidence: it may just be the
    /// only one the control plane could reach at that moment.
    pub fn is_leaderless(&self) -> bool {
        let mut reporting = 0;
        for (_, s) in self.reachable() {
            if s.role.is_leader() {
                return false;
            }
            reporting += 1;
        }
        reporting > 1
    }

    /// Members whose state differs from the one in `prev`.
    pub fn changed_since<'a>(
        &'a self,
        prev: &'a ClusterSnapshot,
    ) -> Vec<(&'a NodeId, Option<&'a MemberState>, &'a MemberState)> {
        self.members
            .iter()
            .filter_map(|(id, now)| {
                let before = prev.members.get(id);
                if before == Some(now) {
                    None
                } else {
                    Some((id, before, now))
                }
            })
            .collect()
    }

    /// Classify members into primary, replicas and unreachable.
    pub fn view(&self, total_nodes: usize) -> ClusterView {
        let primary = self.leader().cloned();

        let mut replicas = vec![];
        let mut unreachable = vec![];

        for (id, s) in self.members.iter() {
            if !s.reachable {
                unreachable.push(id.clone());
            } else if Some(id) != primary.as_ref() {
                replicas.push(id.clone());
            }
        }

        ClusterView {
            primary,
            replicas,
            unreachable,
            total_nodes,
        }
    }
}

impl fmt::Display for ClusterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (id, s)) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", id, s)?;
        }
        write!(f, "}}")
    }
}
