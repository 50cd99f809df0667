use std::fmt;

/// The replication role a member reports.
///
/// Control planes use many names for the same thing. They are folded into
/// three roles: anything that accepts writes is a `Leader`, anything that
/// follows one is a `Replica`, the rest is `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Leader,
    Replica,
    #[default]
    Unknown,
}

impl Role {
    /// Parse a role name reported by a control plane, case-insensitively.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();

        match lower.as_str() {
            "leader" | "primary" | "master" | "standby leader" => Role::Leader,
            "replica" | "standby" | "sync standby" | "quorum standby"
            | "sync_standby" | "quorum_standby" => Role::Replica,
            _ => Role::Unknown,
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::parse(s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => write!(f, "Leader"),
            Role::Replica => write!(f, "Replica"),
            Role::Unknown => write!(f, "Unknown"),
        }
    }
}
