use std::fmt;

use crate::cluster::Role;

/// Identifies a cluster member, e.g. `patroni-1`.
pub type NodeId = String;

/// The health state of a member that serves traffic.
pub const RUNNING: &str = "running";

/// A cluster member as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Member {
    pub name: NodeId,
    pub role: Role,

    /// Health state as reported, e.g. `running`, `streaming`, `stopped`.
    pub state: String,
}

impl Member {
    pub fn new(name: impl ToString, role: Role, state: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            role,
            state: state.to_string(),
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role.is_leader()
    }

    pub fn is_running(&self) -> bool {
        self.state == RUNNING
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.name, self.role, self.state)
    }
}
