//! Observer runtime configuration.

use std::time::Duration;

use anyerror::AnyError;
use clap::Parser;

use crate::config::errors::ConfigError;

/// The runtime configuration for an [`Observer`](crate::Observer) and the
/// sessions that drive it.
///
/// All intervals and timeouts are in milliseconds.
///
/// `poll_interval` bounds the timestamp resolution of every detected event:
/// an event is stamped when the poll that sees the transition completes, so
/// the real transition happened up to one `poll_interval` (plus the query
/// latency) earlier. Keep it well below the RTO you expect to measure.
///
/// `wait_check_interval` is how often a waiter re-reads the event log. It
/// must not be larger than `poll_interval`, otherwise a waiter adds more
/// latency than the detector that produced the event.
#[derive(Clone, Debug, Parser)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Interval in milliseconds between two polls of a detector loop.
    #[clap(long, default_value = "100")]
    pub poll_interval: u64,

    /// Interval in milliseconds at which a waiter re-checks the event log.
    #[clap(long, default_value = "50")]
    pub wait_check_interval: u64,

    /// Time in milliseconds to let the detector loops settle after start
    /// before a measurement begins.
    #[clap(long, default_value = "200")]
    pub stabilization_delay: u64,

    /// Timeout in milliseconds for a single control-plane query.
    ///
    /// A query that exceeds it is treated as inconclusive and retried on the
    /// next tick.
    #[clap(long, default_value = "10000")]
    pub query_timeout: u64,

    /// Timeout in milliseconds for a single service probe.
    #[clap(long, default_value = "3000")]
    pub probe_timeout: u64,

    /// Time in milliseconds `stop()` waits for the detector loops to exit
    /// before aborting them.
    #[clap(long, default_value = "1000")]
    pub shutdown_timeout: u64,

    /// Whether to run one reachability watcher per member, emitting
    /// `node_unreachable` and `node_recovered` events.
    // clap 4 requires `num_args = 0..=1`, or it complains about missing arg
    // error https://github.com/clap-rs/clap/discussions/4374
    #[clap(long,
           default_value_t = true,
           action = clap::ArgAction::Set,
           num_args = 0..=1,
           default_missing_value = "true"
    )]
    pub watch_members: bool,
}

impl Default for Config {
    fn default() -> Self {
        <Self as Parser>::parse_from(Vec::<&'static str>::new())
    }
}

impl Config {
    /// Build a `Config` instance from a series of command line arguments.
    ///
    /// The first element in `args` must be the application name.
    pub fn build(args: &[&str]) -> Result<Config, ConfigError> {
        let config = <Self as Parser>::try_parse_from(args).map_err(|e| {
            ConfigError::ParseError {
                source: AnyError::from(&e),
                args: args.iter().map(|x| x.to_string()).collect(),
            }
        })?;
        config.validate()
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub(crate) fn wait_check_interval(&self) -> Duration {
        Duration::from_millis(self.wait_check_interval)
    }

    pub(crate) fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay)
    }

    pub(crate) fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout)
    }

    pub(crate) fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout)
    }

    pub(crate) fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout)
    }

    /// Validate the state of this config.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let non_zero = [
            ("poll_interval", self.poll_interval),
            ("wait_check_interval", self.wait_check_interval),
            ("query_timeout", self.query_timeout),
            ("probe_timeout", self.probe_timeout),
            ("shutdown_timeout", self.shutdown_timeout),
        ];

        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Zero { name });
            }
        }

        if self.wait_check_interval > self.poll_interval {
            return Err(ConfigError::WaitCheckGTPoll {
                wait_check_interval: self.wait_check_interval,
                poll_interval: self.poll_interval,
            });
        }

        Ok(self)
    }
}
