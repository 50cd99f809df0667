use std::time::Duration;

use anyhow::Result;
use failwatch::DetectionMode;
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// Stop does not wait for slow queries.
///
/// What does this test do?
///
/// - make every control plane query take 2 seconds.
/// - start the observer, let the loops begin their first queries, stop it.
/// - assert stop returns quickly and nothing was recorded.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn stop_cancels_in_flight_queries() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Switchover);

    tc.cluster.set_latency(Some(Duration::from_secs(2)));

    // The baseline query times out: there is no baseline.
    observer.start().await?;
    assert_eq!(None, observer.baseline_primary());

    tokio::time::sleep(Duration::from_millis(50)).await;

    let begin = Instant::now();
    observer.stop().await;
    let elapsed = begin.elapsed();

    assert!(
        elapsed < Duration::from_millis(config.shutdown_timeout),
        "stop took {:?}",
        elapsed
    );

    // In switchover mode a completed query would have reported n1.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(true, observer.events().is_empty());
    Ok(())
}
