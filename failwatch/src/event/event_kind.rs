/// The kinds of state transition a detector reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(derive_more::Display)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// All members report a non-leader role.
    #[display("failure_detected")]
    FailureDetected,

    /// A leader other than the baseline was observed.
    #[display("new_primary")]
    NewPrimary,

    /// The service accepts connections again after an election.
    #[display("service_restored")]
    ServiceRestored,

    #[display("node_unreachable")]
    NodeUnreachable,

    #[display("node_recovered")]
    NodeRecovered,
}
