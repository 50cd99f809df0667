use openraft_macros::add_async_trait;

use crate::cluster::Member;
use crate::cluster::NodeId;
use crate::errors::ControlPlaneError;

/// Read access to the cluster's control plane.
///
/// An implementation answers "who is a member, in which role and health",
/// e.g. by running `patronictl list` inside one of the containers.
///
/// Implementations are queried concurrently by several detector loops and
/// must not block the runtime.
#[add_async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    /// List the members the control plane currently knows about.
    ///
    /// A member that is down may be missing from the list, or be listed with
    /// a non-running state.
    async fn members(&self) -> Result<Vec<Member>, ControlPlaneError>;

    /// Query a single member.
    ///
    /// Returns `Ok(None)` if the member is not listed. An implementation that
    /// can address members individually should return
    /// [`ControlPlaneError::MemberUnreachable`] when that member cannot be
    /// contacted.
    async fn member(
        &self,
        node: &NodeId,
    ) -> Result<Option<Member>, ControlPlaneError> {
        let members = self.members().await?;
        Ok(members.into_iter().find(|m| &m.name == node))
    }

    /// The current leader, if any member reports the leader role.
    async fn primary(&self) -> Result<Option<NodeId>, ControlPlaneError> {
        let members = self.members().await?;
        Ok(members.into_iter().find(|m| m.is_leader()).map(|m| m.name))
    }
}

/// Checks whether the database service accepts client connections.
#[add_async_trait]
pub trait ServiceProbe: Send + Sync + 'static {
    /// Return `true` if a client could connect right now.
    ///
    /// Every failure, including a hung connection attempt, is `false`. The
    /// caller bounds the call with a timeout.
    async fn is_available(&self) -> bool;

    /// A description of what is probed, for logs and event payloads.
    fn endpoint(&self) -> String;
}
