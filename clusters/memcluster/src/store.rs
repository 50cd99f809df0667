use std::sync::Arc;
use std::sync::Mutex;

use failwatch::cluster::ReplicationLag;
use failwatch::errors::DataStoreError;
use failwatch::DataStore;
use tracing::debug;

/// Approximate on-disk size of one written row.
const ROW_BYTES: u64 = 64;

#[derive(Debug, Default)]
struct State {
    /// Id of the last transaction committed on the primary.
    committed: u64,

    /// Id of the last transaction the replicas have.
    replicated: u64,

    /// How many of the latest commits the replicas trail behind.
    lag: u64,

    primary_down: bool,
}

/// An in-memory transactional store with one primary and its replicas.
///
/// Replicas trail the primary by a configurable number of transactions.
/// When the primary fails those are lost: the promoted replica only has up
/// to `replicated`.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<State>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let replicas trail the primary by `lag` transactions from now on.
    pub fn set_lag(&self, lag: u64) {
        let mut state = self.state.lock().unwrap();
        state.lag = lag;
        state.replicated = state.committed.saturating_sub(lag);
    }

    /// Fail the primary. Unreplicated transactions are lost.
    pub fn fail_primary(&self) {
        let mut state = self.state.lock().unwrap();
        debug!(
            "primary failed, committed: {}, replicated: {}",
            state.committed, state.replicated
        );
        state.primary_down = true;
        state.committed = state.replicated;
    }

    /// A replica has been promoted and serves again.
    pub fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.primary_down = false;
    }

    fn check_up(state: &State) -> Result<(), DataStoreError> {
        if state.primary_down {
            Err(DataStoreError::from_string("primary is down"))
        } else {
            Ok(())
        }
    }
}

impl DataStore for MemStore {
    async fn create_table(&self) -> Result<(), DataStoreError> {
        let mut state = self.state.lock().unwrap();
        Self::check_up(&state)?;
        state.committed = 0;
        state.replicated = 0;
        Ok(())
    }

    async fn write(&self, _data: &str) -> Result<u64, DataStoreError> {
        let mut state = self.state.lock().unwrap();
        Self::check_up(&state)?;

        state.committed += 1;
        state.replicated = state.committed.saturating_sub(state.lag);
        Ok(state.committed)
    }

    async fn count(&self) -> Result<u64, DataStoreError> {
        let state = self.state.lock().unwrap();
        Self::check_up(&state)?;
        Ok(state.committed)
    }

    async fn replication_lag(&self) -> Result<ReplicationLag, DataStoreError> {
        let state = self.state.lock().unwrap();
        Ok(ReplicationLag {
            bytes: Some((state.committed - state.replicated) * ROW_BYTES),
            seconds: None,
        })
    }
}
