use anyerror::AnyError;

/// Error variants related to configuration.
#[derive(Debug, thiserror::Error)]
#[derive(PartialEq, Eq)]
pub enum ConfigError {
    #[error("ParseError: {source} while parsing ({args:?})")]
    ParseError { source: AnyError, args: Vec<String> },

    /// An interval or timeout that drives a loop is zero.
    #[error("{name} must be > 0")]
    Zero { name: &'static str },

    #[error("wait_check_interval({wait_check_interval}) must be <= poll_interval({poll_interval})")]
    WaitCheckGTPoll {
        wait_check_interval: u64,
        poll_interval: u64,
    },
}
