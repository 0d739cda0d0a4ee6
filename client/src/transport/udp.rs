use std::{
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket},
};

use log::debug;

use minibot_shared::constants::MAX_DATAGRAM_SIZE;

use super::{RecvError, SendError, UnitSocket};
use crate::UnitError;

/// Non-blocking UDP socket for a remote unit, rebound on every phase change
pub struct Socket {
    socket: Option<UdpSocket>,
    port: Option<u16>,
    buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl Socket {
    pub fn new() -> Self {
        Self {
            socket: None,
            port: None,
            buffer: [0; MAX_DATAGRAM_SIZE],
        }
    }
}

impl Default for Socket {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitSocket for Socket {
    fn listen(&mut self, port: u16) -> Result<(), UnitError> {
        // release the old port first, a unit never holds two
        self.socket = None;
        self.port = None;

        let bind_error = |error: std::io::Error| UnitError::Bind {
            port,
            reason: error.to_string(),
        };
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
            .map_err(bind_error)?;
        socket.set_broadcast(true).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;
        // port 0 asks the OS for an ephemeral one
        let bound_port = socket.local_addr().map_err(bind_error)?.port();

        debug!("unit socket listening on port {}", bound_port);
        self.socket = Some(socket);
        self.port = Some(bound_port);
        Ok(())
    }

    fn local_port(&self) -> Option<u16> {
        self.port
    }

    fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), SendError> {
        let Some(socket) = &self.socket else {
            return Err(SendError);
        };
        socket
            .send_to(payload, address)
            .map(|_| ())
            .map_err(|_| SendError)
    }

    fn broadcast(&mut self, port: u16, payload: &[u8]) -> Result<(), SendError> {
        let address = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, port));
        self.send(&address, payload)
    }

    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        let Some(socket) = &self.socket else {
            return Ok(None);
        };
        match socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::ConnectionReset
                ) =>
            {
                Ok(None)
            }
            Err(_) => Err(RecvError),
        }
    }
}
