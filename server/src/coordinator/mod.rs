mod coordinator_config;
#[allow(clippy::module_inception)]
mod coordinator;
mod discovery_listener;
mod dispatcher;
mod handle;
mod operator;
mod outbox;
mod reaper;

pub use coordinator::Coordinator;
pub use coordinator_config::CoordinatorConfig;
pub use discovery_listener::DiscoveryListener;
pub use dispatcher::Dispatcher;
pub use handle::CoordinatorHandle;
pub use operator::Operator;
pub use reaper::Reaper;
