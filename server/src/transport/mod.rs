cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub mod udp;
    } else {}
}

pub use inner::{PacketReceiver, PacketSender, RecvError, SendError};

mod inner {

    use std::net::SocketAddr;

    #[derive(Debug)]
    pub struct SendError;

    #[derive(Debug)]
    pub struct RecvError;

    pub trait PacketSender: PacketSenderClone + Send + Sync {
        /// Sends a datagram to a single address
        fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
        /// Sends a datagram to every host in the broadcast domain on `port`
        fn broadcast(&self, port: u16, payload: &[u8]) -> Result<(), SendError>;
    }

    /// Used to clone Box<dyn PacketSender>
    pub trait PacketSenderClone {
        /// Clone the boxed PacketSender
        fn clone_box(&self) -> Box<dyn PacketSender>;
    }

    impl<T: 'static + PacketSender + Clone> PacketSenderClone for T {
        fn clone_box(&self) -> Box<dyn PacketSender> {
            Box::new(self.clone())
        }
    }

    impl Clone for Box<dyn PacketSender> {
        fn clone(&self) -> Box<dyn PacketSender> {
            PacketSenderClone::clone_box(self.as_ref())
        }
    }

    pub trait PacketReceiver: Send + Sync {
        /// Receives a datagram from the discovery socket, waiting at most the
        /// socket's receive timeout. `Ok(None)` means nothing arrived.
        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
    }
}
