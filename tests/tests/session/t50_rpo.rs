use std::time::Duration;

use anyhow::Result;
use failwatch::errors::SessionError;
use failwatch::session::RpoScenario;
use failwatch::session::Timeouts;
use failwatch::AnyError;
use failwatch::DetectionMode;
use failwatch::EventKind;
use failwatch::RpoSession;
use pretty_assertions::assert_eq;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

fn scenario() -> RpoScenario {
    RpoScenario {
        test_case: "rpo_stop_primary".to_string(),
        failed_node: "n1".to_string(),
        transactions: 10,
        settle: Duration::from_millis(30),
        timeouts: Timeouts {
            detection: Duration::from_secs(3),
            election: Duration::from_secs(3),
            restoration: Duration::from_secs(3),
        },
    }
}

/// Unreplicated transactions are lost in a failover.
///
/// What does this test do?
///
/// - let replicas trail the primary by 3 transactions.
/// - write 10 transactions, fail n1, elect n2.
/// - assert 3 transactions are reported lost.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn lagging_replicas_lose_transactions() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    tc.store.set_lag(3);

    let observer = tc.observer(config.clone(), DetectionMode::Failover);
    let mut session = RpoSession::new("rpo-1", observer, tc.store.clone());

    let inject = async {
        tc.spawn_failover(
            "n1",
            "n2",
            Duration::from_millis(100),
            Duration::from_millis(50),
        );
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario(), inject).await?;

    assert_eq!(Some("n1".to_string()), record.failed_node);
    assert_eq!(Some("n2".to_string()), record.new_primary_node);
    assert_eq!(Some(10), record.last_transaction_id_written);
    assert_eq!(Some(7), record.last_transaction_id_recovered);
    assert_eq!(Some(3), record.transactions_lost);
    assert_eq!(true, record.data_loss_occurred);
    assert_eq!(Some(3 * 64), record.replication_lag_bytes);

    let rpo = record.rpo_seconds.unwrap();
    assert!(rpo >= 0.029, "rpo: {}", rpo);

    let failure = record.failure_occurred_at.unwrap();
    let read = record.first_read_after_recovery.unwrap();
    assert!(failure <= read);

    assert_eq!(false, session.observer().is_running().await);
    Ok(())
}

/// Fully replicated transactions survive.
///
/// What does this test do?
///
/// - write 10 transactions with no replication lag, fail n1, elect n3.
/// - assert nothing is lost.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn no_loss_without_lag() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();

    let observer = tc.observer(config.clone(), DetectionMode::Failover);
    let mut session = RpoSession::new("rpo-2", observer, tc.store.clone());

    let inject = async {
        tc.spawn_failover(
            "n1",
            "n3",
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario(), inject).await?;

    assert_eq!(Some("n3".to_string()), record.new_primary_node);
    assert_eq!(Some(0), record.transactions_lost);
    assert_eq!(false, record.data_loss_occurred);
    assert_eq!(Some(0), record.replication_lag_bytes);
    Ok(())
}

/// A run that times out still derives what it can.
///
/// What does this test do?
///
/// - write 10 transactions, fail n1 and never elect anyone.
/// - assert the run fails waiting for `new_primary`.
/// - assert the partial record has `rpo_seconds` but no loss figure.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn failed_run_is_finalized() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();

    let observer = tc.observer(config.clone(), DetectionMode::Failover);
    let mut session = RpoSession::new("rpo-3", observer, tc.store.clone());

    let mut scenario = scenario();
    scenario.timeouts.election = Duration::from_millis(300);

    let inject = async {
        tc.fail_leader("n1");
        Ok::<(), AnyError>(())
    };

    let res = session.run(scenario, inject).await;

    assert!(
        matches!(res, Err(SessionError::Timeout {
            milestone: EventKind::NewPrimary,
            ..
        })),
        "got: {:?}",
        res
    );

    let record = session.record().unwrap();
    assert_eq!(Some(10), record.last_transaction_id_written);
    assert_eq!(None, record.last_transaction_id_recovered);
    assert_eq!(None, record.transactions_lost);

    let rpo = record.rpo_seconds.unwrap();
    assert!(rpo >= 0.029, "rpo: {}", rpo);

    assert_eq!(false, session.observer().is_running().await);
    Ok(())
}
