//! The cluster as seen through its control plane.

mod control_plane;
mod data_store;
mod member;
mod role;
mod snapshot;
mod view;


pub use control_plane::ControlPlane;
pub use control_plane::ServiceProbe;
pub use data_store::DataStore;
pub use data_store::ReplicationLag;
pub use member::Member;
pub use member::NodeId;
pub use member::RUNNING;
pub use role::Role;
pub use snapshot::ClusterSnapshot;
pub use snapshot::MemberState;
pub use view::ClusterView;
