use std::time::Duration;

use anyhow::Result;
use failwatch::session::RtoScenario;
use failwatch::session::Timeouts;
use failwatch::sink::new_run_id;
use failwatch::sink::JsonlReader;
use failwatch::sink::JsonlWriter;
use failwatch::AnyError;
use failwatch::DetectionMode;
use failwatch::FailureType;
use failwatch::RtoSession;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::fixtures::test_config;
use crate::fixtures::ut_harness;
use crate::fixtures::TestCluster;

/// A measured record is written as one tagged JSON line.
///
/// What does this test do?
///
/// - run a failover measurement.
/// - write run metadata and the record to a results file.
/// - read the file back and assert the fields survived.
#[tracing::instrument]
#[test_harness::test(harness = ut_harness)]
async fn write_rto_results() -> Result<()> {
    let config = test_config();
    let tc = TestCluster::new();
    let observer = tc.observer(config.clone(), DetectionMode::Failover);

    let run_id = new_run_id();
    let mut session = RtoSession::new(&run_id, observer);

    let scenario = RtoScenario {
        test_case: "pause_primary".to_string(),
        failed_node: "n1".to_string(),
        failure_type: FailureType::Pause,
        timeouts: Timeouts {
            detection: Duration::from_secs(3),
            election: Duration::from_secs(3),
            restoration: Duration::from_secs(3),
        },
    };

    let inject = async {
        tc.spawn_failover(
            "n1",
            "n2",
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        Ok::<(), AnyError>(())
    };

    let record = session.run(scenario, inject).await?;

    let dir = tempfile::tempdir()?;
    let writer = JsonlWriter::create(dir.path(), "rto", &run_id)?;
    writer.write_metadata(json!({"nodes": ["n1", "n2", "n3"]}))?;
    writer.write(&record)?;

    let file_name = writer.path().file_name().unwrap().to_string_lossy();
    assert!(file_name.starts_with("rto_"));
    assert!(file_name.ends_with(&format!("_{}.jsonl", run_id)));

    let all = JsonlReader::read_all(writer.path())?;
    assert_eq!(2, all.len());
    assert_eq!(json!("metadata"), all[0]["type"]);

    let rows = JsonlReader::read_by_type(writer.path(), "rto_metrics")?;
    assert_eq!(1, rows.len());

    let row = &rows[0];
    assert_eq!(json!(run_id), row["run_id"]);
    assert_eq!(json!("pause_primary"), row["test_case"]);
    assert_eq!(json!("pause"), row["failure_type"]);
    assert_eq!(json!("n2"), row["new_primary_node"]);
    assert_eq!(json!(record.total_rto), row["total_rto"]);
    assert!(row["total_rto"].as_f64().unwrap() > 0.0);
    Ok(())
}
