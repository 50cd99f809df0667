use std::time::Duration;

use failwatch::ServiceProbe;
use tracing::debug;

use crate::psql::first_line;
use crate::psql::Psql;

/// Considers the service available once a client session through the pooler
/// can run `SELECT 1`.
///
/// A pooler keeps accepting connections while it has no primary behind it,
/// so a successful connect alone says nothing about recovery.
#[derive(Debug, Clone)]
pub struct SqlProbe {
    psql: Psql,
    timeout: Duration,
}

impl SqlProbe {
    pub fn new(psql: Psql, timeout: Duration) -> Self {
        Self { psql, timeout }
    }
}

impl ServiceProbe for SqlProbe {
    async fn is_available(&self) -> bool {
        let res = self.psql.query("SELECT 1", self.timeout).await;

        match res {
            Ok(out) => {
                let ok = is_one(&out);
                if !ok {
                    debug!("{} answered: {:?}", self.endpoint(), out);
                }
                ok
            }
            Err(e) => {
                debug!("{} unavailable: {}", self.endpoint(), e);
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.psql.endpoint()
    }
}

pub(crate) fn is_one(out: &str) -> bool {
    first_line(out) == Some("1")
}
