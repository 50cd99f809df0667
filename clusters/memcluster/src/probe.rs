use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use failwatch::ServiceProbe;

/// A service probe whose answer is set by hand.
#[derive(Debug, Clone)]
pub struct MemProbe {
    available: Arc<AtomicBool>,
    probes: Arc<AtomicU64>,
}

impl MemProbe {
    pub fn new(available: bool) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(available)),
            probes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }
}

impl ServiceProbe for MemProbe {
    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.available.load(Ordering::Relaxed)
    }

    fn endpoint(&self) -> String {
        "memcluster".to_string()
    }
}
