use std::time::Duration;

use failwatch::cluster::ReplicationLag;
use failwatch::errors::DataStoreError;
use failwatch::DataStore;
use tracing::debug;
use tracing::info;

use crate::psql::first_line;
use crate::psql::quote_literal;
use crate::psql::Psql;

/// PostgreSQL behind the pooler, as the store an RPO measurement writes to.
///
/// Every statement is its own transaction, committed before `psql` returns.
#[derive(Debug, Clone)]
pub struct PgStore {
    psql: Psql,
    table: String,
    timeout: Duration,
}

impl PgStore {
    pub fn new(psql: Psql, table: impl ToString, timeout: Duration) -> Self {
        Self {
            psql,
            table: table.to_string(),
            timeout,
        }
    }

    async fn query(&self, sql: &str) -> Result<String, DataStoreError> {
        self.psql
            .query(sql, self.timeout)
            .await
            .map_err(|e| DataStoreError::new(&e))
    }

    pub(crate) fn create_sql(&self) -> String {
        format!(
            "DROP TABLE IF EXISTS {t}; \
             CREATE TABLE {t} (\
             id BIGSERIAL PRIMARY KEY, \
             data TEXT NOT NULL, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            t = self.table
        )
    }

    pub(crate) fn insert_sql(&self, data: &str) -> String {
        format!(
            "INSERT INTO {} (data) VALUES ({}) RETURNING id",
            self.table,
            quote_literal(data)
        )
    }

    pub(crate) fn count_sql(&self) -> String {
        format!("SELECT count(*) FROM {}", self.table)
    }
}

/// Lag of the slowest replica, asked of the primary.
///
/// The comment keeps pgpool from sending it to a standby.
pub(crate) const LAG_SQL: &str = "/*NO LOAD BALANCE*/ SELECT \
     COALESCE(max(pg_wal_lsn_diff(pg_current_wal_lsn(), replay_lsn)), 0)::bigint, \
     COALESCE(EXTRACT(EPOCH FROM max(replay_lag)), 0)::float8 \
     FROM pg_stat_replication";

fn empty() -> DataStoreError {
    DataStoreError::from_string("empty psql output")
}

pub(crate) fn parse_u64(out: &str) -> Result<u64, DataStoreError> {
    let line = first_line(out).ok_or_else(empty)?;

    line.parse::<u64>().map_err(|e| DataStoreError::new(&e))
}

/// Parse `bytes|seconds`. An empty column is unknown.
pub(crate) fn parse_lag(out: &str) -> Result<ReplicationLag, DataStoreError> {
    let line = first_line(out).ok_or_else(empty)?;

    let mut cols = line.split('|').map(|c| c.trim());

    let (Some(bytes), Some(seconds), None) =
        (cols.next(), cols.next(), cols.next())
    else {
        return Err(DataStoreError::from_string(format!(
            "expect 2 columns, got: {:?}",
            line
        )));
    };

    let bytes = if bytes.is_empty() {
        None
    } else {
        let b = bytes.parse::<u64>().map_err(|e| DataStoreError::new(&e))?;
        Some(b)
    };

    let seconds = if seconds.is_empty() {
        None
    } else {
        let s = seconds.parse::<f64>().map_err(|e| DataStoreError::new(&e))?;
        Some(s)
    };

    Ok(ReplicationLag { bytes, seconds })
}

impl DataStore for PgStore {
    async fn create_table(&self) -> Result<(), DataStoreError> {
        info!("create table {} via {}", self.table, self.psql.endpoint());
        self.query(&self.create_sql()).await?;
        Ok(())
    }

    async fn write(&self, data: &str) -> Result<u64, DataStoreError> {
        let out = self.query(&self.insert_sql(data)).await?;
        parse_u64(&out)
    }

    async fn count(&self) -> Result<u64, DataStoreError> {
        let out = self.query(&self.count_sql()).await?;
        let n = parse_u64(&out)?;
        debug!("{} rows in {}", n, self.table);
        Ok(n)
    }

    async fn replication_lag(&self) -> Result<ReplicationLag, DataStoreError> {
        let out = self.query(LAG_SQL).await?;
        parse_lag(&out)
    }
}
