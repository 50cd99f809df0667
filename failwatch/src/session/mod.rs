//! RTO and RPO measurement sessions.

mod anchor;
mod failure_type;
mod rpo;
mod rpo_record;
mod rto;
mod rto_record;
mod rto_timeline;
mod summary;


pub use anchor::Anchor;
pub use failure_type::FailureType;
pub use rpo::RpoScenario;
pub use rpo::RpoSession;
pub use rpo_record::RpoRecord;
pub use rto::RtoScenario;
pub use rto::RtoSession;
pub use rto::Timeouts;
pub use rto_record::RtoRecord;
pub use rto_timeline::RtoDurations;
pub use rto_timeline::RtoTimeline;
pub use summary::events_summary;
