use std::time::Duration;

use anyhow::Result;
use failwatch::errors::SessionError;
use failwatch::session::RtoScenario;
use failwatch::session::Timeouts;
use failwatch::AnyError;
use failwatch::DetectionMode;
use failwatch::FailureType;
use failwatch::RtoSession;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

fn scenario() -> RtoScenario {
    RtoScenario {
        test_case: "switchover".to_string(),
        failed_node: "n1".to_string(),
        failure_type: FailureType::Switchover,
        timeouts: Timeouts {
            detection: Duration::from_secs(3),
            election: Duration::from_secs(3),
            restoration: Duration::from_secs(3),
        },
    }
}

/// A planned switchover has no detection phase.
///
/// What does this test do?
///
/// - run an RTO session in switchover mode, handing leadership to n3.
/// - assert detection is absent and election is measured from injection.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn switchover_is_measured() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Switchover);

    let mut session = RtoSession::new("run-sw", observer);

    let cluster = tc.cluster.clone();
    let inject = async move {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cluster.promote("n3");
        });
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario(), inject).await?;

    assert_eq!(Some("n3".to_string()), record.new_primary_node);
    assert_eq!(None, record.detection_time);
    assert_eq!(None, record.failure_detected_at);

    let election = record.election_time.unwrap();
    let restoration = record.restoration_time.unwrap();
    let total = record.total_rto.unwrap();

    assert!(election >= 0.09, "election: {}", election);
    assert!((election + restoration - total).abs() < 1e-6);
    Ok(())
}

/// The observer mode has to match the failure type.
///
/// What does this test do?
///
/// - run a switchover scenario on a failover-mode observer.
/// - assert it is rejected before anything starts.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn mode_mismatch() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-mm", observer);

    let res = session
        .run(scenario(), async { Ok::<(), AnyError>(()) })
        .await;

    assert!(matches!(
        res,
        Err(SessionError::ModeMismatch {
            observer: DetectionMode::Failover,
            scenario: DetectionMode::Switchover,
        })
    ));
    assert!(session.record().is_none());
    assert_eq!(false, session.observer().is_running().await);
    Ok(())
}

/// A switchover is measured even when the leader cannot be read at start.
///
/// What does this test do?
///
/// - make the first control plane query fail, so there is no baseline.
/// - run an RTO session in switchover mode, handing leadership to n3.
/// - assert n3 is the new primary, not the unchanged leader n1.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn switchover_without_baseline() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Switchover);

    tc.cluster.fail_next_queries(1);

    let mut session = RtoSession::new("run-sw-nb", observer);

    let cluster = tc.cluster.clone();
    let inject = async move {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cluster.promote("n3");
        });
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario(), inject).await?;

    assert_eq!(Some("n3".to_string()), record.new_primary_node);
    assert_eq!(None, record.detection_time);
    assert!(record.total_rto.is_some());
    Ok(())
}
