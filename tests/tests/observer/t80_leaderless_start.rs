use std::time::Duration;

use anyhow::Result;
use failwatch::DetectionMode;
use failwatch::EventKind;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ticks;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// Observation that starts in the middle of a failover.
///
/// What does this test do?
///
/// - the cluster has no leader and the service is down from the first tick.
/// - wait for all three milestones, issued together with `start()`.
/// - a leader appears at tick 4, the service comes back at tick 6.
/// - assert every waiter gets its event, once each, in milestone order.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn all_milestones_after_leaderless_start() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    tc.cluster.demote_all();
    tc.probe.set_available(false);

    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let timeout = Duration::from_secs(3);

    let script = async {
        ticks(&config, 3).await;

        // Stay leaderless until the failure is on record.
        observer
            .wait(Some(timeout))
            .kind(EventKind::FailureDetected, "leaderless")
            .await?;

        tc.cluster.promote("n2");
        ticks(&config, 2).await;
        tc.probe.set_available(true);
        Ok::<(), anyhow::Error>(())
    };

    // The waiters are polled first, so they are anchored before `start()`.
    let (failure, elected, restored, started, scripted) = tokio::join!(
        observer.wait_for_event(EventKind::FailureDetected, timeout),
        observer.wait_for_event(EventKind::NewPrimary, timeout),
        observer.wait_for_event(EventKind::ServiceRestored, timeout),
        observer.start(),
        script,
    );
    started?;
    scripted?;

    let failure = failure?;
    let elected = elected?;
    let restored = restored?;

    assert_eq!(Some(&"n2".to_string()), elected.node_id());
    assert!(failure.timestamp <= elected.timestamp);
    assert!(elected.timestamp <= restored.timestamp);

    observer.stop().await;

    let milestones = [
        EventKind::FailureDetected,
        EventKind::NewPrimary,
        EventKind::ServiceRestored,
    ];

    let recorded: Vec<_> = observer
        .events()
        .into_iter()
        .filter(|e| milestones.contains(&e.kind))
        .collect();
    assert_eq!(vec![failure, elected, restored], recorded);
    Ok(())
}
