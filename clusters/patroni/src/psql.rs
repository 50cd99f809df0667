use std::time::Duration;

use tracing::debug;

use crate::docker::Docker;
use crate::patroni_config::PatroniConfig;
use crate::DockerError;

/// A `psql` client run in a container with `docker exec`.
///
/// Output is unaligned and tuples-only: one row per line, columns separated
/// by `|`, no headers and no command tags.
#[derive(Debug, Clone)]
pub struct Psql {
    docker: Docker,
    container: String,
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl Psql {
    pub fn new(config: &PatroniConfig) -> Self {
        Self {
            docker: Docker::new(&config.docker_bin),
            container: config.client_container.clone(),
            host: config.db_host.clone(),
            port: config.db_port,
            user: config.db_user.clone(),
            password: config.db_password.clone(),
            database: config.db_name.clone(),
        }
    }

    /// `host:port` the client connects to.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The command run in the container for `sql`.
    pub(crate) fn command(&self, sql: &str) -> Vec<String> {
        let port = self.port.to_string();

        let args = [
            "psql",
            "-X",
            "-q",
            "-t",
            "-A",
            "-v",
            "ON_ERROR_STOP=1",
            "-h",
            self.host.as_str(),
            "-p",
            port.as_str(),
            "-U",
            self.user.as_str(),
            "-d",
            self.database.as_str(),
            "-c",
            sql,
        ];

        args.iter().map(|x| x.to_string()).collect()
    }

    /// Run `sql` and return its output.
    ///
    /// A connection attempt gives up within `timeout` too, rounded up to a
    /// whole second as libpq requires.
    pub async fn query(
        &self,
        sql: &str,
        timeout: Duration,
    ) -> Result<String, DockerError> {
        debug!("psql {}: {}", self.endpoint(), sql);

        let command = self.command(sql);
        let command: Vec<&str> = command.iter().map(|x| x.as_str()).collect();

        let connect_timeout = connect_timeout_secs(timeout).to_string();

        let envs = [
            ("PGPASSWORD", self.password.as_str()),
            ("PGCONNECT_TIMEOUT", connect_timeout.as_str()),
        ];

        self.docker
            .exec_with_env(&self.container, &envs, &command, timeout)
            .await
    }
}

/// libpq takes whole seconds and treats 1 as 2, so never go below 2.
pub(crate) fn connect_timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_millis().div_ceil(1_000) as u64;
    secs.max(2)
}

/// Quote `s` as an SQL string literal.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// The first non-empty output line.
pub(crate) fn first_line(out: &str) -> Option<&str> {
    out.lines().map(|l| l.trim()).find(|l| !l.is_empty())
}
