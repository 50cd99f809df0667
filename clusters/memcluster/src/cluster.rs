use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyerror::AnyError;
use failwatch::errors::ControlPlaneError;
use failwatch::ControlPlane;
use failwatch::Member;
use failwatch::NodeId;
use failwatch::Role;
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    members: BTreeMap<NodeId, Member>,

    /// Members that are down: absent from listings and unreachable.
    down: BTreeSet<NodeId>,

    /// Number of upcoming queries that fail with `Unavailable`.
    failing: u64,

    /// Delay applied to every query.
    latency: Option<Duration>,

    queries: u64,
}

/// An in-memory cluster.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemCluster {
    state: Arc<Mutex<State>>,
}

impl MemCluster {
    /// A healthy cluster of `nodes`, with `leader` as the leader and the rest
    /// streaming replicas.
    pub fn new<I, T>(nodes: I, leader: &str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let mut state = State::default();

        for id in nodes {
            let id = id.to_string();
            let m = if id == leader {
                Member::new(&id, Role::Leader, "running")
            } else {
                Member::new(&id, Role::Replica, "streaming")
            };
            state.members.insert(id, m);
        }

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Replace a member's reported role and state.
    pub fn set_member(&self, member: Member) {
        let mut state = self.state.lock().unwrap();
        debug!("set member {}", member);
        state.members.insert(member.name.clone(), member);
    }

    pub fn set_state(&self, node: &str, health: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(m) = state.members.get_mut(node) {
            m.state = health.to_string();
        }
    }

    /// Take a member down: it disappears from listings.
    pub fn stop_node(&self, node: &str) {
        let mut state = self.state.lock().unwrap();
        debug!("stop {}", node);
        state.down.insert(node.to_string());
    }

    /// Bring a member back as a replica in `health` state.
    pub fn start_node(&self, node: &str, health: &str) {
        let mut state = self.state.lock().unwrap();
        debug!("start {} as {}", node, health);
        state.down.remove(node);
        state
            .members
            .insert(node.to_string(), Member::new(node, Role::Replica, health));
    }

    /// Demote every member to replica: the cluster has no leader.
    pub fn demote_all(&self) {
        let mut state = self.state.lock().unwrap();
        debug!("demote all");
        for m in state.members.values_mut() {
            m.role = Role::Replica;
        }
    }

    /// Make `node` the only leader.
    pub fn promote(&self, node: &str) {
        let mut state = self.state.lock().unwrap();
        debug!("promote {}", node);
        for (id, m) in state.members.iter_mut() {
            if id == node {
                m.role = Role::Leader;
                m.state = "running".to_string();
            } else {
                m.role = Role::Replica;
            }
        }
    }

    /// Give `node` the leader role without demoting anyone.
    pub fn add_leader(&self, node: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(m) = state.members.get_mut(node) {
            m.role = Role::Leader;
        }
    }

    /// Make the next `n` queries fail.
    pub fn fail_next_queries(&self, n: u64) {
        self.state.lock().unwrap().failing = n;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().unwrap().latency = latency;
    }

    /// Number of queries answered or failed so far.
    pub fn query_count(&self) -> u64 {
        self.state.lock().unwrap().queries
    }

    /// The first listed leader.
    pub fn leader(&self) -> Option<NodeId> {
        self.listed().into_iter().find(|m| m.is_leader()).map(|m| m.name)
    }

    fn listed(&self) -> Vec<Member> {
        let state = self.state.lock().unwrap();
        state
            .members
            .values()
            .filter(|m| !state.down.contains(&m.name))
            .cloned()
            .collect()
    }

    /// Count the query, apply latency and injected failures.
    async fn query(&self) -> Result<(), ControlPlaneError> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.queries += 1;
            state.latency
        };

        if let Some(l) = latency {
            tokio::time::sleep(l).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failing > 0 {
            state.failing -= 1;
            return Err(ControlPlaneError::Unavailable(AnyError::error(
                "injected query failure",
            )));
        }
        Ok(())
    }
}

impl ControlPlane for MemCluster {
    async fn members(&self) -> Result<Vec<Member>, ControlPlaneError> {
        self.query().await?;
        Ok(self.listed())
    }

    async fn member(
        &self,
        node: &NodeId,
    ) -> Result<Option<Member>, ControlPlaneError> {
        self.query().await?;

        let state = self.state.lock().unwrap();
        if state.down.contains(node) {
            return Err(ControlPlaneError::MemberUnreachable {
                node: node.clone(),
                source: AnyError::error("member is down"),
            });
        }
        Ok(state.members.get(node).cloned())
    }
}
