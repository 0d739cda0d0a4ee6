//! # Minibot Server
//! The coordinator side of the minibot protocol. Discovers remote units that
//! broadcast on the discovery port, assigns each a command channel, pairs
//! them with controllers, and streams control frames to the paired units
//! while reaping the ones that go silent.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use minibot_shared::{
        constants, ButtonSet, ControlFrame, DropStats, Frame, Instant, SessionMode, UnitId,
    };
}

mod controller;
mod coordinator;
mod error;
mod events;
mod registry;

pub use controller::{ControllerId, ControllerSample, ControllerSource};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, DiscoveryListener, Dispatcher, Operator,
    Reaper,
};
pub use error::CoordinatorError;
pub use events::{
    CoordinatorEvent, CoordinatorEvents, DiscoverEvent, ErrorEvent, EvictEvent, ReassignEvent,
    UnpairEvent,
};
pub use registry::{
    Announcement, ChannelAllocator, DispatchTarget, EvictedUnit, Pairing, Registry,
    RemoteUnitRecord, SharedRegistry,
};
