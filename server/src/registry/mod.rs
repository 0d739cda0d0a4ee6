mod channel_allocator;
mod pairing;
mod record;
#[allow(clippy::module_inception)]
mod registry;

pub use channel_allocator::ChannelAllocator;
pub use pairing::Pairing;
pub use record::RemoteUnitRecord;
pub use registry::{Announcement, DispatchTarget, EvictedUnit, Registry, SharedRegistry};
