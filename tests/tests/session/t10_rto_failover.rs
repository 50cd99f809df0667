use std::time::Duration;

use anyhow::Result;
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
        test_case: "stop_primary".to_string(),
        failed_node: "n1".to_string(),
        failure_type: FailureType::Stop,
        timeouts: Timeouts {
            detection: Duration::from_secs(3),
            election: Duration::from_secs(3),
            restoration: Duration::from_secs(3),
        },
    }
}

/// A complete failover measurement.
///
/// What does this test do?
///
/// - run an RTO session: n1 fails, n2 is elected 150ms later, the service is
///   back 100ms after that.
/// - assert all three phases are measured and add up to the total.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn failover_is_measured() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-1", observer);

    let inject = async {
        tc.spawn_failover(
            "n1",
            "n2",
            Duration::from_millis(150),
            Duration::from_millis(100),
        );
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario(), inject).await?;

    assert_eq!("run-1", record.run_id);
    assert_eq!("stop_primary", record.test_case);
    assert_eq!(Some(FailureType::Stop), record.failure_type);
    assert_eq!(Some("n1".to_string()), record.failed_node);
    assert_eq!(Some("n2".to_string()), record.new_primary_node);

    let detection = record.detection_time.unwrap();
    let election = record.election_time.unwrap();
    let restoration = record.restoration_time.unwrap();
    let total = record.total_rto.unwrap();

    assert!(election > 0.05, "election: {}", election);
    assert!(restoration > 0.05, "restoration: {}", restoration);
    assert!((detection + election + restoration - total).abs() < 1e-6);

    let injected = record.failure_injected_at.unwrap();
    let detected = record.failure_detected_at.unwrap();
    let elected = record.new_primary_elected_at.unwrap();
    let restored = record.service_restored_at.unwrap();
    assert!(injected <= detected);
    assert!(detected <= elected);
    assert!(elected <= restored);

    assert_eq!(false, session.observer().is_running().await);
    Ok(())
}

/// The session's view of the cluster and its event summary after a run.
///
/// What does this test do?
///
/// - run a failover measurement.
/// - assert the cluster view shows the new primary and the failed member.
/// - assert the summary lists the milestones.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn view_and_summary_after_failover() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-2", observer);

    let inject = async {
        tc.spawn_failover(
            "n1",
            "n2",
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        Ok::<(), AnyError>(())
    };

    session.run(scenario(), inject).await?;

    let view = session.cluster_view();
    assert_eq!(Some("n2".to_string()), view.primary);
    assert_eq!(vec!["n3".to_string()], view.replicas);
    assert_eq!(vec!["n1".to_string()], view.unreachable);
    assert_eq!(3, view.total_nodes);

    let summary = session.events_summary();
    assert!(summary.contains("DETECTED EVENTS"));
    assert!(summary.contains("failure_detected @ cluster"));
    assert!(summary.contains("new_primary @ n2"));
    assert!(summary.contains("service_restored @ cluster"));
    assert!(summary.contains("node_unreachable @ n1"));
    Ok(())
}

/// A failing injection ends the run.
///
/// What does this test do?
///
/// - run with an injection that returns an error.
/// - assert the error is reported and the observer is stopped.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn failed_injection() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let mut session = RtoSession::new("run-3", observer);

    let inject = async { Err(AnyError::error("docker is gone")) };

    let res = session.run(scenario(), inject).await;

    assert!(matches!(res, Err(failwatch::errors::SessionError::Injection(_))));
    assert_eq!(false, session.observer().is_running().await);

    let record = session.record().unwrap();
    assert_eq!(None, record.detection_time);
    assert_eq!(None, record.total_rto);
    Ok(())
}
