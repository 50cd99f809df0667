use chrono::Utc;
use rand::Rng;

/// A run id: `<YYYYmmdd_HHMMSS>_<8 hex digits>`.
pub fn new_run_id() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}_{:08x}", Utc::now().format("%Y%m%d_%H%M%S"), suffix)
}
