use std::time::Duration;

use failwatch::FailureType;
use memcluster::MemCluster;
use memcluster::MemProbe;
use memcluster::MemStore;
use tokio::time::sleep;
use tracing::info;

/// Plays what Patroni would do after a failure is injected, on an in-memory
/// cluster.
#[derive(Debug, Clone)]
pub struct Simulator {
    pub cluster: MemCluster,
    pub probe: MemProbe,
    pub store: MemStore,

    /// Delay from injection to the members noticing the leader is gone.
    pub ttl: Duration,

    /// Delay from the leader loss to a new leader.
    pub election: Duration,

    /// Delay from the election to the pooler routing to the new leader.
    pub reroute: Duration,
}

impl Simulator {
    pub fn new(cluster: MemCluster, probe: MemProbe, store: MemStore) -> Self {
        Self {
            cluster,
            probe,
            store,
            ttl: Duration::from_millis(400),
            election: Duration::from_millis(800),
            reroute: Duration::from_millis(300),
        }
    }

    /// Inject the failure and let the cluster react in the background.
    pub fn inject(&self, failed: &str, candidate: &str, ft: FailureType) {
        info!("inject {} into {}, candidate: {}", ft, failed, candidate);

        let this = self.clone();
        let failed = failed.to_string();
        let candidate = candidate.to_string();

        match ft {
            FailureType::Switchover => {
                tokio::spawn(async move { this.switchover(&candidate).await });
            }
            _ => {
                tokio::spawn(
                    async move { this.failover(&failed, &candidate).await },
                );
            }
        }
    }

    async fn failover(&self, failed: &str, candidate: &str) {
        self.probe.set_available(false);
        self.store.fail_primary();

        sleep(self.ttl).await;
        self.cluster.stop_node(failed);
        self.cluster.demote_all();

        sleep(self.election).await;
        self.cluster.promote(candidate);
        self.store.recover();

        sleep(self.reroute).await;
        self.probe.set_available(true);

        // The failed member rejoins as a replica later.
        sleep(self.election).await;
        self.cluster.start_node(failed, "starting");
        sleep(self.reroute).await;
        self.cluster.set_state(failed, "running");
    }

    async fn switchover(&self, candidate: &str) {
        self.probe.set_available(false);

        sleep(self.election).await;
        self.cluster.promote(candidate);

        sleep(self.reroute).await;
        self.probe.set_available(true);
    }
}
