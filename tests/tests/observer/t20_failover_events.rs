use std::time::Duration;

use anyhow::Result;
use failwatch::ClusterView;
use failwatch::DetectionMode;
use failwatch::EventKind;
use failwatch::Subject;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ticks;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// A full failover is seen as three ordered milestones.
///
/// What does this test do?
///
/// - observe a healthy 3-member cluster led by n1.
/// - n1 goes down, nobody leads for a while, then n2 is promoted and the
///   service comes back.
/// - assert failure_detected, new_primary and service_restored are each
///   recorded exactly once and in that order.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn failover_milestones_in_order() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    observer.start().await?;
    ticks(&config, 3).await;
    assert_eq!(true, observer.events().is_empty());
    assert_eq!(Some("n1".to_string()), observer.get_current_primary());

    tc.fail_leader("n1");

    let failure = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::FailureDetected, "failure_detected")
        .await?;
    assert_eq!(Subject::Cluster, failure.node);

    // Leaderless for a few polls: the detection is not repeated.
    ticks(&config, 5).await;

    tc.elect("n2");

    let elected = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::NewPrimary, "new_primary")
        .await?;
    assert_eq!(Some(&"n2".to_string()), elected.node_id());

    ticks(&config, 3).await;
    assert_eq!(0, observer.log().count(EventKind::ServiceRestored));

    tc.probe.set_available(true);

    let restored = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::ServiceRestored, "service_restored")
        .await?;

    ticks(&config, 5).await;
    observer.stop().await;

    assert!(failure.timestamp <= elected.timestamp);
    assert!(elected.timestamp <= restored.timestamp);

    let log = observer.log();
    assert_eq!(1, log.count(EventKind::FailureDetected));
    assert_eq!(1, log.count(EventKind::NewPrimary));
    assert_eq!(1, log.count(EventKind::ServiceRestored));

    let events = observer.events();
    for w in events.windows(2) {
        assert!(w[0].timestamp <= w[1].timestamp);
    }

    assert_eq!(
        ClusterView {
            primary: Some("n2".to_string()),
            replicas: vec!["n3".to_string()],
            unreachable: vec!["n1".to_string()],
            total_nodes: 3,
        },
        observer.snapshot()
    );

    Ok(())
}

/// Member reachability events.
///
/// What does this test do?
///
/// - take n3 down, and bring it back first `starting` then `running`.
/// - assert node_unreachable then node_recovered for n3, once each.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn member_down_and_back() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    observer.start().await?;
    ticks(&config, 3).await;

    tc.cluster.stop_node("n3");
    let down = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::NodeUnreachable, "node_unreachable")
        .await?;
    assert_eq!(Some(&"n3".to_string()), down.node_id());

    ticks(&config, 3).await;
    tc.cluster.start_node("n3", "starting");
    ticks(&config, 3).await;
    assert_eq!(0, observer.log().count(EventKind::NodeRecovered));

    tc.cluster.set_state("n3", "running");
    let back = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::NodeRecovered, "node_recovered")
        .await?;
    assert_eq!(Some(&"n3".to_string()), back.node_id());

    ticks(&config, 3).await;
    observer.stop().await;

    assert_eq!(1, observer.log().count(EventKind::NodeUnreachable));
    assert_eq!(1, observer.log().count(EventKind::NodeRecovered));

    // One member down is not a cluster failure.
    assert_eq!(0, observer.log().count(EventKind::FailureDetected));
    Ok(())
}
