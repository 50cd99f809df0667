use std::time::Duration;

use anyhow::Result;
use failwatch::errors::SessionError;
use failwatch::session::RtoScenario;
use failwatch::session::Timeouts;
use failwatch::AnyError;
use failwatch::DetectionMode;
use failwatch::EventKind;
use failwatch::FailureType;
use failwatch::RtoSession;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// No leader is ever elected.
///
/// What does this test do?
///
/// - fail n1 and never elect a new leader.
/// - assert the run times out waiting for new_primary.
/// - assert the partial record keeps the detection phase, and the observer
///   is stopped.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn election_timeout_keeps_partial_record() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-to", observer);

    let scenario = RtoScenario {
        test_case: "kill_primary".to_string(),
        failed_node: "n1".to_string(),
        failure_type: FailureType::Kill,
        timeouts: Timeouts {
            detection: Duration::from_secs(3),
            election: Duration::from_millis(300),
            restoration: Duration::from_secs(3),
        },
    };

    let inject = async {
        tc.fail_leader("n1");
        Ok::<(), AnyError>(())
    };

    let res = session.run(scenario, inject).await;

    match res {
        Err(SessionError::Timeout {
            milestone, timeout, ..
        }) => {
            assert_eq!(EventKind::NewPrimary, milestone);
            assert_eq!(Duration::from_millis(300), timeout);
        }
        other => panic!("expect election timeout, got: {:?}", other),
    }

    assert_eq!(false, session.observer().is_running().await);

    let record = session.record().unwrap();
    assert!(record.detection_time.is_some());
    assert!(record.failure_detected_at.is_some());
    assert_eq!(None, record.election_time);
    assert_eq!(None, record.restoration_time);
    assert_eq!(None, record.total_rto);
    assert_eq!(None, record.new_primary_node);
    Ok(())
}

/// Waiting before a measurement has started.
///
/// What does this test do?
///
/// - call a wait step without `start_measurement()`.
/// - assert it fails at once.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn wait_without_measurement() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-ns", observer);
    session.start_observation().await?;

    let res = session
        .wait_for_failure_detection(Duration::from_secs(10))
        .await;
    assert!(matches!(res, Err(SessionError::NotStarted)));

    session.stop_observation().await;
    assert!(session.finalize().is_none());
    Ok(())
}
