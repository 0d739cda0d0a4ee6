use log::info;

use minibot_shared::{DropStats, Instant};

use crate::{
    controller::ControllerSource,
    coordinator::{
        discovery_listener::DiscoveryListener, dispatcher::Dispatcher, operator::Operator,
        reaper::Reaper, CoordinatorConfig, CoordinatorHandle,
    },
    events::CoordinatorEvents,
    registry::{Registry, SharedRegistry},
    transport::{PacketReceiver, PacketSender},
    CoordinatorError,
};

/// The coordinator half of the protocol. Can be driven by hand through
/// `receive` & `dispatch`, or moved onto its own threads with `spawn`.
pub struct Coordinator {
    config: CoordinatorConfig,
    listener: DiscoveryListener,
    reaper: Reaper,
    dispatcher: Dispatcher,
    operator: Operator,
}

impl Coordinator {
    /// Create a new Coordinator on top of an already bound socket
    pub fn new(
        config: CoordinatorConfig,
        sender: Box<dyn PacketSender>,
        receiver: Box<dyn PacketReceiver>,
    ) -> Self {
        let now = Instant::now();
        let registry = SharedRegistry::new(Registry::new(
            config.command_port_base,
            config.channel_count,
        ));

        let listener = DiscoveryListener::new(registry.clone(), sender.clone(), receiver);
        let reaper = Reaper::new(
            registry.clone(),
            config.reap_interval,
            config.eviction_timeout,
            &now,
        );
        let dispatcher = Dispatcher::new(
            registry.clone(),
            sender.clone(),
            config.status_interval,
            config.max_sample_age,
            &now,
        );
        let operator = Operator::new(
            registry,
            sender,
            config.discovery_port,
            config.max_pending_events,
        );

        Self {
            config,
            listener,
            reaper,
            dispatcher,
            operator,
        }
    }

    /// Binds the discovery port over UDP. Failing to bind is the only fatal
    /// error, and names the port.
    #[cfg(feature = "transport_udp")]
    pub fn bind(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let (sender, receiver) = crate::transport::udp::Socket::listen(
            config.discovery_port,
            config.recv_timeout,
            config.send_timeout,
        )?;
        info!("coordinator listening on port {}", config.discovery_port);
        Ok(Self::new(config, sender, receiver))
    }

    /// Handles waiting datagrams, then evicts stale units if due. Sends the
    /// Operator failed since the last call are reported here too.
    pub fn receive(&mut self, now: &Instant) -> CoordinatorEvents {
        let mut events = CoordinatorEvents::new();
        self.listener.receive(now, &mut events);
        self.reaper.maintain(now, &mut events);
        self.operator.take_failures(&mut events);
        events
    }

    /// Performs one dispatch tick
    pub fn dispatch<S: ControllerSource + ?Sized>(
        &mut self,
        source: &mut S,
        now: &Instant,
    ) -> CoordinatorEvents {
        let mut events = CoordinatorEvents::new();
        self.dispatcher.dispatch(source, now, &mut events);
        events
    }

    pub fn operator(&self) -> Operator {
        self.operator.clone()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn drop_stats(&self) -> DropStats {
        self.listener.drop_stats()
    }

    /// Latches the emergency stop and tells every unit, best effort. The
    /// socket closes when the Coordinator is dropped.
    pub fn shutdown(self) {
        info!("coordinator shutting down");
        self.operator.emergency_stop(true);
    }

    /// Moves the receive loop and the dispatch loop onto their own threads
    pub fn spawn<S: ControllerSource + Send + 'static>(
        self,
        source: S,
    ) -> Result<CoordinatorHandle, CoordinatorError> {
        CoordinatorHandle::spawn(
            self.config,
            self.listener,
            self.reaper,
            self.dispatcher,
            self.operator,
            source,
        )
    }
}
