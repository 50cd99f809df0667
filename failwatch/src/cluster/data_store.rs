use openraft_macros::add_async_trait;

use crate::errors::DataStoreError;

/// Replication lag as reported by the store. Either part may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplicationLag {
    pub bytes: Option<u64>,
    pub seconds: Option<f64>,
}

/// The transactional store an RPO measurement writes to and reads back from.
///
/// Every successful [`write`](DataStore::write) commits one row and returns a
/// transaction id. Ids start from 1 and grow by one per write, so after a
/// failover [`count`](DataStore::count) equals the id of the last surviving
/// transaction.
#[add_async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// Create the table used by the measurement, dropping leftovers.
    async fn create_table(&self) -> Result<(), DataStoreError>;

    /// Commit one transaction carrying `data` and return its id.
    async fn write(&self, data: &str) -> Result<u64, DataStoreError>;

    /// Number of committed rows visible to a reader.
    async fn count(&self) -> Result<u64, DataStoreError>;

    /// Lag between the primary and its replicas, if the store can tell.
    async fn replication_lag(&self) -> Result<ReplicationLag, DataStoreError> {
        Ok(ReplicationLag::default())
    }
}
