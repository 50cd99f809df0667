#![doc = include_str!("lib_readme.md")]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::bool_comparison)]
#![allow(clippy::type_complexity)]
#![deny(unused_qualifications)]

macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let n = &name[..name.len() - 3];
        let nn = n.replace("::{{closure}}", "");
        nn
    }};
}

mod config;
mod detector;

pub mod cluster;
pub mod errors;
pub mod event;
pub mod observer;
pub mod session;
pub mod sink;
pub mod testing;

pub use anyerror;
pub use anyerror::AnyError;
pub use openraft_macros::add_async_trait;

pub use crate::cluster::ClusterSnapshot;
pub use crate::cluster::ClusterView;
pub use crate::cluster::ControlPlane;
pub use crate::cluster::DataStore;
pub use crate::cluster::Member;
pub use crate::cluster::NodeId;
pub use crate::cluster::Role;
pub use crate::cluster::ServiceProbe;
pub use crate::config::Config;
pub use crate::config::ConfigError;
pub use crate::event::Event;
pub use crate::event::EventKind;
pub use crate::event::EventLog;
pub use crate::event::Subject;
pub use crate::observer::DetectionMode;
pub use crate::observer::Observer;
pub use crate::observer::Wait;
pub use crate::observer::WaitError;
pub use crate::session::FailureType;
pub use crate::session::RpoRecord;
pub use crate::session::RpoSession;
pub use crate::session::RtoRecord;
pub use crate::session::RtoSession;
