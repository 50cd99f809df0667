//! `failwatch` backends for a Patroni cluster running in Docker containers.
//!
//! - [`PatroniCtl`] reads cluster membership with `patronictl list -f json`,
//!   executed through `docker exec` in whichever member answers first.
//! - [`Docker`] injects failures into containers.
//! - [`SqlProbe`] runs `SELECT 1` through the pooler with [`Psql`].
//! - [`PgStore`] is the table an RPO measurement writes to.
//! - [`StatsCollector`] samples `docker stats` while a scenario runs.

mod docker;
mod docker_stats;
mod member_row;
mod patroni_config;
mod patronictl;
mod pg_store;
mod psql;
mod sql_probe;


pub use docker::Docker;
pub use docker::DockerError;
pub use docker_stats::ContainerSample;
pub use docker_stats::ContainerStats;
pub use docker_stats::StatsCollector;
pub use member_row::MemberRow;
pub use patroni_config::PatroniConfig;
pub use patronictl::PatroniCtl;
pub use pg_store::PgStore;
pub use psql::Psql;
pub use sql_probe::SqlProbe;
