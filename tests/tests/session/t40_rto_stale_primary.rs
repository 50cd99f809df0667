use std::time::Duration;

use anyhow::Result;
use failwatch::testing::append_event;
use failwatch::DetectionMode;
use failwatch::EventKind;
use failwatch::FailureType;
use failwatch::RtoSession;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// A new_primary naming the failed node is not the end of the election.
///
/// What does this test do?
///
/// - start a measurement for failed node n1.
/// - record new_primary(n1), then new_primary(n2) 100ms later.
/// - assert the session reports n2, timed at the second event.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn stale_new_primary_is_skipped() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-stale", observer);
    session.start_observation().await?;

    let n1 = "n1".to_string();
    session.start_measurement("stale", &n1, FailureType::Stop);

    let log = session.observer().log().clone();
    append_event(&log, EventKind::NewPrimary, "n1".into(), None);

    let log2 = log.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        append_event(&log2, EventKind::NewPrimary, "n2".into(), None);
    });

    let node = session
        .wait_for_new_primary(Duration::from_secs(3), Some(&n1))
        .await?;
    assert_eq!("n2", node);

    let second = log
        .find(|e| e.kind == EventKind::NewPrimary && e.node_id() == Some(&node))
        .unwrap();
    assert_eq!(Some(second.timestamp), session.timeline().elected);

    session.stop_observation().await;

    let record = session.finalize().unwrap();
    assert_eq!(Some("n2".to_string()), record.new_primary_node);
    Ok(())
}

/// Without an old primary to rule out, the first new_primary counts.
///
/// What does this test do?
///
/// - record new_primary(n1) after the measurement started.
/// - wait without an old primary, and assert n1 is returned.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn first_new_primary_without_old() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-first", observer);
    session.start_observation().await?;

    session.start_measurement("first", &"n1".to_string(), FailureType::Stop);
    append_event(
        session.observer().log(),
        EventKind::NewPrimary,
        "n1".into(),
        None,
    );

    let node = session
        .wait_for_new_primary(Duration::from_millis(500), None)
        .await?;
    assert_eq!("n1", node);

    session.stop_observation().await;
    Ok(())
}
