use std::time::Duration;

use anyhow::Result;
use failwatch::DetectionMode;
use failwatch::EventKind;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ticks;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// A switchover goes straight to a new primary.
///
/// What does this test do?
///
/// - observe in switchover mode.
/// - hand leadership from n1 to n3 without a leaderless phase.
/// - assert new_primary(n3) and service_restored, and no failure_detected.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn switchover_skips_failure_detection() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Switchover);

    observer.start().await?;
    ticks(&config, 3).await;

    // The baseline leader is never reported as new.
    assert_eq!(0, observer.log().count(EventKind::NewPrimary));

    tc.cluster.promote("n3");

    let elected = observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::NewPrimary, "new_primary")
        .await?;
    assert_eq!(Some(&"n3".to_string()), elected.node_id());
    assert_eq!(
        Some(serde_json::json!({"old_primary": "n1", "new_primary": "n3"})),
        elected.payload
    );

    observer
        .wait(Some(Duration::from_secs(3)))
        .kind(EventKind::ServiceRestored, "service_restored")
        .await?;

    observer.stop().await;
    assert_eq!(0, observer.log().count(EventKind::FailureDetected));
    Ok(())
}

/// In failover mode an election without a detected failure is not reported.
///
/// What does this test do?
///
/// - observe in failover mode.
/// - move leadership to n2 directly.
/// - assert no new_primary is recorded.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn failover_mode_needs_failure_first() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    observer.start().await?;
    ticks(&config, 3).await;

    tc.cluster.promote("n2");
    ticks(&config, 10).await;

    observer.stop().await;
    assert_eq!(0, observer.log().count(EventKind::NewPrimary));
    assert_eq!(Some("n2".to_string()), observer.get_current_primary());
    Ok(())
}
