mod logging;
mod simulator;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use failwatch::session::RpoScenario;
use failwatch::session::RtoScenario;
use failwatch::session::Timeouts;
use failwatch::sink::new_run_id;
use failwatch::sink::JsonlWriter;
use failwatch::testing::nid;
use failwatch::AnyError;
use failwatch::Config;
use failwatch::FailureType;
use failwatch::Observer;
use failwatch::RpoSession;
use failwatch::RtoSession;
use memcluster::MemCluster;
use memcluster::MemProbe;
use memcluster::MemStore;
use serde_json::json;

use crate::logging::init_logging;
use crate::simulator::Simulator;

/// Run a failure drill against a simulated three-member cluster and write
/// the measured RTO, or RPO with `--rpo`, to a JSONL file.
#[derive(Debug, Parser)]
struct Args {
    #[clap(long, value_enum, default_value = "stop")]
    failure_type: FailureType,

    /// Measure data loss instead of recovery time.
    #[clap(long)]
    rpo: bool,

    /// Transactions written before the failure, with `--rpo`.
    #[clap(long, default_value = "100")]
    transactions: u64,

    /// Transactions the replicas trail behind, with `--rpo`.
    #[clap(long, default_value = "0")]
    lag: u64,

    #[clap(long, default_value = "_results")]
    out_dir: String,

    #[clap(long, default_value = "_log")]
    log_dir: String,

    #[clap(long, default_value = "DEBUG")]
    log_level: String,

    #[clap(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _g = init_logging("drill", &args.log_dir, &args.log_level)?;

    let config = Arc::new(args.config.clone().validate()?);

    let nodes = vec![nid("patroni-1"), nid("patroni-2"), nid("patroni-3")];
    let (primary, candidate) = (&nodes[0], &nodes[1]);

    let cluster = MemCluster::new(nodes.iter(), primary);
    let probe = MemProbe::new(true);
    let store = MemStore::new();
    store.set_lag(args.lag);

    let sim = Simulator::new(cluster.clone(), probe.clone(), store.clone());

    let run_id = new_run_id();
    let prefix = if args.rpo { "rpo" } else { "rto" };
    let writer = JsonlWriter::create(&args.out_dir, prefix, &run_id)?;

    writer.write_metadata(json!({
        "nodes": nodes,
        "failure_type": args.failure_type,
        "config": config.as_ref(),
    }))?;

    let observer = Observer::new(
        config.clone(),
        nodes.clone(),
        args.failure_type.detection_mode(),
        cluster,
        probe,
    );

    let timeouts = Timeouts {
        detection: Duration::from_secs(10),
        election: Duration::from_secs(20),
        restoration: Duration::from_secs(10),
    };

    if args.rpo {
        let mut session = RpoSession::new(&run_id, observer, store);

        let scenario = RpoScenario {
            test_case: format!("rpo_{}_primary", args.failure_type),
            failed_node: primary.clone(),
            transactions: args.transactions,
            settle: Duration::from_millis(200),
            timeouts,
        };

        let res = session
            .run(scenario, async {
                sim.inject(primary, candidate, args.failure_type);
                Ok::<(), AnyError>(())
            })
            .await;

        if let Some(record) = session.record() {
            writer.write(record)?;
        }

        let record = res?;
        println!(
            "lost {:?} of {:?} transactions, rpo: {:?}s",
            record.transactions_lost,
            record.last_transaction_id_written,
            record.rpo_seconds
        );
    } else {
        let mut session = RtoSession::new(&run_id, observer);

        let scenario = RtoScenario {
            test_case: format!("rto_{}_primary", args.failure_type),
            failed_node: primary.clone(),
            failure_type: args.failure_type,
            timeouts,
        };

        let res = session
            .run(scenario, async {
                sim.inject(primary, candidate, args.failure_type);
                Ok::<(), AnyError>(())
            })
            .await;

        println!("{}", session.events_summary());

        if let Some(record) = session.record() {
            writer.write(record)?;
        }

        let record = res?;
        println!(
            "new primary: {:?}, total rto: {:?}s",
            record.new_primary_node, record.total_rto
        );
    }

    println!("results: {}", writer.path().display());
    Ok(())
}
