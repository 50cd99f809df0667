use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing::Instrument;

use crate::docker::Docker;
use crate::patroni_config::PatroniConfig;
use crate::DockerError;

/// One line of `docker stats --format '{{json .}}'`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize)]
pub(crate) struct StatsLine {
    #[serde(rename = "Name")]
    pub(crate) name: String,

    #[serde(rename = "CPUPerc")]
    pub(crate) cpu: String,

    /// `used / limit`
    #[serde(rename = "MemUsage")]
    pub(crate) mem_usage: String,

    #[serde(rename = "MemPerc")]
    pub(crate) mem: String,

    /// `rx / tx`
    #[serde(rename = "NetIO")]
    pub(crate) net_io: String,

    /// `read / write`
    #[serde(rename = "BlockIO")]
    pub(crate) block_io: String,
}

/// One container's resource usage at one moment.
///
/// Network and block I/O are cumulative since the container started.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSample {
    pub at: Instant,
    pub cpu_percent: f64,
    pub memory_bytes: f64,
    pub memory_percent: f64,
    pub net_rx_bytes: f64,
    pub net_tx_bytes: f64,
    pub block_read_bytes: f64,
    pub block_write_bytes: f64,
}

impl ContainerSample {
    pub(crate) fn from_line(line: &StatsLine, at: Instant) -> Self {
        let (memory_bytes, _limit) = parse_pair(&line.mem_usage);
        let (net_rx_bytes, net_tx_bytes) = parse_pair(&line.net_io);
        let (block_read_bytes, block_write_bytes) = parse_pair(&line.block_io);

        Self {
            at,
            cpu_percent: parse_percent(&line.cpu).unwrap_or_default(),
            memory_bytes,
            memory_percent: parse_percent(&line.mem).unwrap_or_default(),
            net_rx_bytes,
            net_tx_bytes,
            block_read_bytes,
            block_write_bytes,
        }
    }
}

/// Averages and peaks of one container over a collection period.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize)]
pub struct ContainerStats {
    pub cpu_percent_avg: f64,
    pub cpu_percent_max: f64,
    pub memory_bytes_avg: f64,
    pub memory_bytes_max: f64,
    pub memory_percent_avg: f64,
    pub memory_percent_max: f64,
    pub net_rx_bytes: f64,
    pub net_tx_bytes: f64,
    pub block_read_bytes: f64,
    pub block_write_bytes: f64,
    pub sample_count: usize,
    pub duration_seconds: f64,
}

impl ContainerStats {
    /// Summarize `samples`, oldest first. I/O totals come from the last one.
    pub fn summarize(samples: &[ContainerSample]) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;

        let n = samples.len() as f64;
        let avg = |f: fn(&ContainerSample) -> f64| {
            samples.iter().map(f).sum::<f64>() / n
        };
        let max = |f: fn(&ContainerSample) -> f64| {
            samples.iter().map(f).fold(f64::MIN, f64::max)
        };

        Some(Self {
            cpu_percent_avg: avg(|s| s.cpu_percent),
            cpu_percent_max: max(|s| s.cpu_percent),
            memory_bytes_avg: avg(|s| s.memory_bytes),
            memory_bytes_max: max(|s| s.memory_bytes),
            memory_percent_avg: avg(|s| s.memory_percent),
            memory_percent_max: max(|s| s.memory_percent),
            net_rx_bytes: last.net_rx_bytes,
            net_tx_bytes: last.net_tx_bytes,
            block_read_bytes: last.block_read_bytes,
            block_write_bytes: last.block_write_bytes,
            sample_count: samples.len(),
            duration_seconds: (last.at - first.at).as_secs_f64(),
        })
    }
}

type Samples = BTreeMap<String, Vec<ContainerSample>>;

/// Samples `docker stats` for a set of containers in the background.
///
/// Call [`start`](Self::start) before the scenario and
/// [`stop`](Self::stop) after it to get per-container averages.
pub struct StatsCollector {
    docker: Docker,
    containers: Vec<String>,
    interval: Duration,
    samples: Arc<Mutex<Samples>>,
    running: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl StatsCollector {
    pub fn new(
        docker: Docker,
        containers: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            docker,
            containers,
            interval,
            samples: Arc::new(Mutex::new(BTreeMap::new())),
            running: None,
        }
    }

    /// Collect from every member and from the client container.
    pub fn from_config(config: &PatroniConfig) -> Self {
        let mut containers = config.nodes.clone();
        containers.push(config.client_container.clone());

        Self::new(
            Docker::new(&config.docker_bin),
            containers,
            Duration::from_millis(config.stats_interval),
        )
    }

    /// Drop earlier samples and start collecting. No-op if collecting.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        self.samples.lock().unwrap().clear();

        let (tx, rx) = watch::channel(false);

        let span = tracing::debug_span!("docker_stats");
        let fut = sample_loop(
            self.docker.clone(),
            self.containers.clone(),
            self.interval,
            self.samples.clone(),
            rx,
        );
        let handle = tokio::spawn(fut.instrument(span));

        info!("docker stats started for {}", self.containers.join(", "));
        self.running = Some((tx, handle));
    }

    /// Stop collecting and summarize what was collected.
    pub async fn stop(&mut self) -> BTreeMap<String, ContainerStats> {
        if let Some((tx, handle)) = self.running.take() {
            let _ = tx.send(true);

            if let Err(e) = handle.await {
                warn!("docker stats task: {}", e);
            }
        }

        let summary = self.summary();
        info!(
            "docker stats stopped, {} containers, {} samples",
            summary.len(),
            summary.values().map(|s| s.sample_count).sum::<usize>()
        );
        summary
    }

    pub fn summary(&self) -> BTreeMap<String, ContainerStats> {
        let samples = self.samples.lock().unwrap();
        samples
            .iter()
            .filter_map(|(name, xs)| {
                ContainerStats::summarize(xs).map(|s| (name.clone(), s))
            })
            .collect()
    }
}

async fn sample_loop(
    docker: Docker,
    containers: Vec<String>,
    interval: Duration,
    samples: Arc<Mutex<Samples>>,
    mut rx_shutdown: watch::Receiver<bool>,
) {
    loop {
        if *rx_shutdown.borrow() {
            break;
        }

        let res = futures::select_biased! {
            _ = rx_shutdown.changed().fuse() => break,
            res = sample(&docker, &containers, interval).fuse() => res,
        };

        match res {
            Ok(got) => {
                let mut samples = samples.lock().unwrap();
                for (name, sample) in got {
                    samples.entry(name).or_default().push(sample);
                }
            }
            Err(e) => warn!("docker stats: {}", e),
        }

        futures::select_biased! {
            _ = rx_shutdown.changed().fuse() => break,
            _ = tokio::time::sleep(interval).fuse() => {}
        }
    }

    debug!("docker stats loop exit");
}

async fn sample(
    docker: &Docker,
    containers: &[String],
    interval: Duration,
) -> Result<Vec<(String, ContainerSample)>, DockerError> {
    let mut args = vec!["stats", "--no-stream", "--format", "{{json .}}"];
    args.extend(containers.iter().map(|x| x.as_str()));

    let out = docker.run(&args, interval + Duration::from_secs(10)).await?;
    Ok(parse_stats(&out, Instant::now()))
}

/// Parse `docker stats` JSON lines. Unparseable lines are skipped.
pub(crate) fn parse_stats(
    out: &str,
    at: Instant,
) -> Vec<(String, ContainerSample)> {
    let mut res = vec![];

    for line in out.lines().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<StatsLine>(line) {
            Ok(x) => {
                let sample = ContainerSample::from_line(&x, at);
                res.push((x.name, sample));
            }
            Err(e) => warn!("skip docker stats line {:?}: {}", line, e),
        }
    }

    res
}

/// `"12.5%"` to `12.5`. Stopped containers report `"--"`.
pub(crate) fn parse_percent(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').parse().ok()
}

/// `"1.2MB / 3.4MB"` to bytes on both sides. Unparseable sides are 0.
pub(crate) fn parse_pair(s: &str) -> (f64, f64) {
    let mut sides =
        s.split('/').map(|x| parse_bytes(x).unwrap_or_default());

    let a = sides.next().unwrap_or_default();
    let b = sides.next().unwrap_or_default();
    (a, b)
}

/// A docker size such as `"25.5MiB"` or `"1.2kB"` in bytes.
///
/// Docker prints memory in binary units and I/O in decimal ones.
pub(crate) fn parse_bytes(s: &str) -> Option<f64> {
    let s = s.trim();

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let num: f64 = num.parse().ok()?;

    let mul = match unit.trim() {
        "" | "B" => 1.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };

    Some(num * mul)
}
