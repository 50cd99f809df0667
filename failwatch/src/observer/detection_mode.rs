/// Which sequence of events the detectors expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Unplanned: the leader fails, then a new one is elected.
    /// `new_primary` is only looked for after `failure_detected`.
    #[default]
    #[display("failover")]
    Failover,

    /// Planned: leadership is handed over without a leaderless phase.
    /// `new_primary` is looked for from the start.
    #[display("switchover")]
    Switchover,
}
