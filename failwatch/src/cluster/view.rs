use std::fmt;

use crate::cluster::NodeId;

/// Who is who in the cluster at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct ClusterView {
    pub primary: Option<NodeId>,
    pub replicas: Vec<NodeId>,
    pub unreachable: Vec<NodeId>,
    pub total_nodes: usize,
}

impl fmt::Display for ClusterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "primary: {}, replicas: [{}], unreachable: [{}], total: {}",
            self.primary.as_deref().unwrap_or("-"),
            self.replicas.join(","),
            self.unreachable.join(","),
            self.total_nodes
        )
    }
}
