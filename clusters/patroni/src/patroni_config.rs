use clap::Parser;

/// Where the Patroni cluster is and how to reach it.
#[derive(Clone, Debug, Parser)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct PatroniConfig {
    /// Patroni member container names, tried in this order.
    #[clap(long, value_delimiter = ',', default_value = "patroni-1,patroni-2,patroni-3")]
    pub nodes: Vec<String>,

    /// The docker executable.
    #[clap(long, default_value = "docker")]
    pub docker_bin: String,

    /// Timeout in milliseconds for one `docker exec`.
    #[clap(long, default_value = "10000")]
    pub exec_timeout: u64,

    /// Timeout in milliseconds for `switchover` and `failover` commands.
    #[clap(long, default_value = "30000")]
    pub command_timeout: u64,

    /// Container `psql` runs in. Its network must reach `db_host`.
    #[clap(long, default_value = "pgpool")]
    pub client_container: String,

    /// Host clients connect to, normally the pooler.
    #[clap(long, default_value = "pgpool")]
    pub db_host: String,

    #[clap(long, default_value = "5432")]
    pub db_port: u16,

    #[clap(long, default_value = "postgres")]
    pub db_user: String,

    #[clap(long, env = "PGPASSWORD", default_value = "postgres")]
    pub db_password: String,

    #[clap(long, default_value = "postgres")]
    pub db_name: String,

    /// Table the RPO measurement writes to. It is dropped and recreated.
    #[clap(long, default_value = "failwatch_rpo")]
    pub table: String,

    /// Interval in milliseconds between two `docker stats` samples.
    #[clap(long, default_value = "2000")]
    pub stats_interval: u64,
}

impl Default for PatroniConfig {
    fn default() -> Self {
        <Self as Parser>::parse_from(Vec::<&'static str>::new())
    }
}
