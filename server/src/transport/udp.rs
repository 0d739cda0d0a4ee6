use std::{
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket},
    sync::Arc,
    time::Duration,
};

use log::trace;

use minibot_shared::constants::MAX_DATAGRAM_SIZE;

use super::{PacketReceiver, PacketSender, RecvError, SendError};
use crate::CoordinatorError;

/// The coordinator's single UDP socket, bound to the discovery port with
/// broadcast enabled. Replies and command traffic leave from the same socket.
pub struct Socket;

impl Socket {
    pub fn listen(
        port: u16,
        recv_timeout: Duration,
        send_timeout: Duration,
    ) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), CoordinatorError> {
        let bind_error = |error: std::io::Error| CoordinatorError::Bind {
            port,
            reason: error.to_string(),
        };

        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
            .map_err(bind_error)?;
        socket.set_broadcast(true).map_err(bind_error)?;
        socket
            .set_read_timeout(Some(recv_timeout))
            .map_err(bind_error)?;
        socket
            .set_write_timeout(Some(send_timeout))
            .map_err(bind_error)?;

        let socket = Arc::new(socket);
        let sender = UdpPacketSender {
            socket: socket.clone(),
        };
        let receiver = UdpPacketReceiver {
            socket,
            buffer: [0; MAX_DATAGRAM_SIZE],
        };

        Ok((Box::new(sender), Box::new(receiver)))
    }
}

#[derive(Clone)]
struct UdpPacketSender {
    socket: Arc<UdpSocket>,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        self.socket
            .send_to(payload, address)
            .map(|_| ())
            .map_err(|_| SendError)
    }

    fn broadcast(&self, port: u16, payload: &[u8]) -> Result<(), SendError> {
        let address = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, port));
        self.send(&address, payload)
    }
}

struct UdpPacketReceiver {
    socket: Arc<UdpSocket>,
    buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(error) if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            // a previous send hit a closed port; not a receive failure
            Err(error) if error.kind() == ErrorKind::ConnectionReset => {
                trace!("ignoring connection reset on coordinator socket");
                Ok(None)
            }
            Err(_) => Err(RecvError),
        }
    }
}
