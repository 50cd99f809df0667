use crate::observer::DetectionMode;

/// How the failure is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// Graceful stop of the primary's container.
    #[display("stop")]
    Stop,

    /// `SIGKILL` to the primary's container.
    #[display("kill")]
    Kill,

    /// Freeze the primary's processes.
    #[display("pause")]
    Pause,

    /// Cut the primary off the network.
    #[display("network")]
    Network,

    /// Planned handover of leadership.
    #[display("switchover")]
    Switchover,
}

impl FailureType {
    pub fn detection_mode(&self) -> DetectionMode {
        match self {
            FailureType::Switchover => DetectionMode::Switchover,
            _ => DetectionMode::Failover,
        }
    }
}
