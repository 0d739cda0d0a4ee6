cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub mod udp;
    } else {}
}

pub use inner::{RecvError, SendError, UnitSocket};

mod inner {

    use std::net::SocketAddr;

    use crate::UnitError;

    #[derive(Debug)]
    pub struct SendError;

    #[derive(Debug)]
    pub struct RecvError;

    /// The unit's single datagram socket. It listens on exactly one port at a
    /// time: the discovery port while advertising, the command channel while
    /// assigned.
    pub trait UnitSocket: Send {
        /// Closes the current binding, if any, and listens on `port`. Port 0
        /// binds an ephemeral port, reported afterwards by `local_port`.
        fn listen(&mut self, port: u16) -> Result<(), UnitError>;
        /// Port currently listened on
        fn local_port(&self) -> Option<u16>;
        /// Sends a datagram to a single address
        fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError>;
        /// Sends a datagram to every host in the broadcast domain on `port`
        fn broadcast(&mut self, port: u16, payload: &[u8]) -> Result<(), SendError>;
        /// Receives a waiting datagram without blocking
        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
    }

    impl<T: UnitSocket + ?Sized> UnitSocket for Box<T> {
        fn listen(&mut self, port: u16) -> Result<(), UnitError> {
            (**self).listen(port)
        }

        fn local_port(&self) -> Option<u16> {
            (**self).local_port()
        }

        fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
            (**self).send(address, payload)
        }

        fn broadcast(&mut self, port: u16, payload: &[u8]) -> Result<(), SendError> {
            (**self).broadcast(port, payload)
        }

        fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
            (**self).receive()
        }
    }
}
