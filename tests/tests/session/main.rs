#[path = "../fixtures/mod.rs"]
mod fixtures;

// The number indicate the preferred running order for these case.
mod t10_rto_failover;
mod t20_rto_switchover;
mod t30_rto_timeout;
mod t40_rto_stale_primary;
mod t50_rpo;
mod t60_write_results;
