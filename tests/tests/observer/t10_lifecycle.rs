use anyhow::Result;
use failwatch::errors::ObserverError;
use failwatch::DetectionMode;
use failwatch::EventKind;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ticks;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// Observer lifecycle.
///
/// What does this test do?
///
/// - start an observer twice: the second start is a no-op.
/// - stop it, and assert a restart without reset is refused.
/// - reset it, and assert it starts again with an empty log.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn start_stop_reset() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    observer.start().await?;
    observer.start().await?;
    assert_eq!(true, observer.is_running().await);
    assert_eq!(Some("n1".to_string()), observer.baseline_primary());

    tc.fail_leader("n1");
    observer
        .wait(Some(config_timeout()))
        .kind(EventKind::FailureDetected, "failure_detected")
        .await?;

    observer.stop().await;
    assert_eq!(false, observer.is_running().await);

    // Events survive stop.
    assert_eq!(1, observer.log().count(EventKind::FailureDetected));

    // Stopping again is harmless.
    observer.stop().await;

    let res = observer.start().await;
    assert_eq!(Err(ObserverError::Stopped), res);

    observer.reset().await?;
    assert_eq!(true, observer.events().is_empty());

    tc.elect("n2");
    observer.start().await?;
    assert_eq!(Some("n2".to_string()), observer.baseline_primary());

    ticks(&config, 5).await;
    assert_eq!(None, observer.get_event(EventKind::FailureDetected, None));

    let res = observer.reset().await;
    assert_eq!(Err(ObserverError::Running), res);

    observer.stop().await;
    Ok(())
}

/// A stopped observer emits nothing.
///
/// What does this test do?
///
/// - start and stop an observer.
/// - fail the leader after the stop, and assert no event is recorded.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn no_events_after_stop() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    observer.start().await?;
    ticks(&config, 3).await;
    observer.stop().await;

    let before = observer.events().len();

    tc.fail_leader("n1");
    ticks(&config, 10).await;

    assert_eq!(before, observer.events().len());
    Ok(())
}

fn config_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(3)
}
