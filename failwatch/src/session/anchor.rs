use chrono::DateTime;
use chrono::Utc;
use tokio::time::Instant;

/// Pairs a monotonic instant with the wall-clock time it was taken at.
///
/// Wall-clock timestamps in records are derived from monotonic instants
/// through one anchor, so differences between them equal the monotonic
/// differences even if the system clock is adjusted meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub instant: Instant,
    pub wall: DateTime<Utc>,
}

impl Anchor {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// The wall-clock time corresponding to `instant`.
    pub fn wall_at(&self, instant: Instant) -> DateTime<Utc> {
        if instant >= self.instant {
            self.wall + to_chrono(instant - self.instant)
        } else {
            self.wall - to_chrono(self.instant - instant)
        }
    }
}

fn to_chrono(d: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}
