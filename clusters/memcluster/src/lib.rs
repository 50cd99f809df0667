//! An in-memory stand-in for a replicated database cluster.
//!
//! Tests and demos drive it directly: stop a member, promote another one,
//! make the service unavailable, make the next queries fail. The detector
//! loops see the changes through [`ControlPlane`], [`ServiceProbe`] and
//! [`DataStore`].

mod cluster;
mod probe;
mod store;


pub use cluster::MemCluster;
pub use probe::MemProbe;
pub use store::MemStore;
