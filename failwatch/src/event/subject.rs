use crate::cluster::NodeId;

/// What an event is about: one member, or the cluster as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[display("cluster")]
    Cluster,

    #[display("{_0}")]
    Node(NodeId),
}

impl Subject {
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Subject::Cluster => None,
            Subject::Node(id) => Some(id),
        }
    }
}

impl From<NodeId> for Subject {
    fn from(id: NodeId) -> Self {
        Subject::Node(id)
    }
}

impl From<&str> for Subject {
    fn from(id: &str) -> Self {
        Subject::Node(id.to_string())
    }
}
