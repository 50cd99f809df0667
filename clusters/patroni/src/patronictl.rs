use std::time::Duration;

use anyerror::AnyError;
use failwatch::errors::ControlPlaneError;
use failwatch::ControlPlane;
use failwatch::Member;
use failwatch::NodeId;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::docker::Docker;
use crate::member_row::MemberRow;
use crate::patroni_config::PatroniConfig;
use crate::DockerError;

const LIST: &[&str] = &["patronictl", "list", "-f", "json"];

/// Patroni control plane reached through `docker exec`.
#[derive(Debug, Clone)]
pub struct PatroniCtl {
    docker: Docker,
    nodes: Vec<NodeId>,
    exec_timeout: Duration,
    command_timeout: Duration,
}

impl PatroniCtl {
    pub fn new(config: &PatroniConfig) -> Self {
        Self {
            docker: Docker::new(&config.docker_bin),
            nodes: config.nodes.clone(),
            exec_timeout: Duration::from_millis(config.exec_timeout),
            command_timeout: Duration::from_millis(config.command_timeout),
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Run `command` in the first member container that answers.
    async fn exec_on_any(
        &self,
        command: &[&str],
        timeout: Duration,
    ) -> Result<String, ControlPlaneError> {
        let mut last_err = None;

        for node in self.nodes.iter() {
            match self.docker.exec(node, command, timeout).await {
                Ok(out) => return Ok(out),
                Err(e) => {
                    debug!("exec on {} failed: {}", node, e);
                    last_err = Some(e);
                }
            }
        }

        let err = match last_err {
            Some(e) => AnyError::new(&e),
            None => AnyError::error("no patroni node configured"),
        };
        Err(ControlPlaneError::Unavailable(err))
    }

    fn parse(out: &str) -> Result<Vec<Member>, ControlPlaneError> {
        let rows = MemberRow::parse_list(out)
            .map_err(|e| ControlPlaneError::invalid_response(&e))?;
        Ok(rows.into_iter().map(Member::from).collect())
    }

    /// Planned handover of leadership to `candidate`.
    pub async fn switchover(
        &self,
        candidate: &str,
    ) -> Result<(), ControlPlaneError> {
        info!("switchover to {}", candidate);
        self.exec_on_any(
            &["patronictl", "switchover", "--candidate", candidate, "--force"],
            self.command_timeout,
        )
        .await?;
        Ok(())
    }

    /// Forced failover, to `candidate` or to whichever member Patroni picks.
    pub async fn failover(
        &self,
        candidate: Option<&str>,
    ) -> Result<(), ControlPlaneError> {
        info!("failover to {:?}", candidate);

        let mut cmd = vec!["patronictl", "failover", "--force"];
        if let Some(c) = candidate {
            cmd.extend_from_slice(&["--candidate", c]);
        }

        self.exec_on_any(&cmd, self.command_timeout).await?;
        Ok(())
    }
}

impl ControlPlane for PatroniCtl {
    async fn members(&self) -> Result<Vec<Member>, ControlPlaneError> {
        let out = self.exec_on_any(LIST, self.exec_timeout).await?;
        Self::parse(&out)
    }

    /// Ask the member itself, so that a dead container reads as unreachable
    /// even while the rest of the cluster still lists it.
    async fn member(
        &self,
        node: &NodeId,
    ) -> Result<Option<Member>, ControlPlaneError> {
        let res = self.docker.exec(node, LIST, self.exec_timeout).await;

        let out = match res {
            Ok(x) => x,
            Err(e @ DockerError::Spawn { .. }) => {
                warn!("cannot run docker: {}", e);
                return Err(ControlPlaneError::unavailable(&e));
            }
            Err(e) => {
                return Err(ControlPlaneError::MemberUnreachable {
                    node: node.clone(),
                    source: AnyError::new(&e),
                });
            }
        };

        let members = Self::parse(&out)?;
        Ok(members.into_iter().find(|m| &m.name == node))
    }
}
