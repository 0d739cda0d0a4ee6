/// In-memory broadcast domain for E2E testing
/// Routes datagrams between one coordinator and any number of units without
/// network I/O, optionally dropping a seeded fraction of them

use std::{
    collections::{HashMap, HashSet, VecDeque},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

use minibot_client::{
    transport::{RecvError as UnitRecvError, SendError as UnitSendError, UnitSocket},
    UnitError,
};
use minibot_server::transport::{
    PacketReceiver as CoordinatorPacketReceiver, PacketSender as CoordinatorPacketSender,
    RecvError as CoordinatorRecvError, SendError as CoordinatorSendError,
};
use minibot_shared::{Frame, FrameError};

// First port handed out when a socket listens on port 0
const EPHEMERAL_PORT_START: u16 = 49152;

/// Where a datagram was addressed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Unicast(SocketAddr),
    Broadcast(u16),
}

/// One datagram as it left its sender, whether or not anyone received it
#[derive(Clone, Debug)]
pub struct SentDatagram {
    pub from: SocketAddr,
    pub to: Destination,
    pub payload: Vec<u8>,
}

impl SentDatagram {
    pub fn frame(&self) -> Result<Frame, FrameError> {
        Frame::decode(&self.payload)
    }
}

struct NetworkState {
    inboxes: HashMap<SocketAddr, VecDeque<(SocketAddr, Box<[u8]>)>>,
    sent: Vec<SentDatagram>,
    loss: Option<(fastrand::Rng, f32)>,
    failing_senders: HashSet<SocketAddr>,
}

impl NetworkState {
    fn lose(&mut self) -> bool {
        match &mut self.loss {
            Some((rng, rate)) => rng.f32() < *rate,
            None => false,
        }
    }

    fn deliver(&mut self, from: SocketAddr, to: Destination, payload: &[u8]) {
        self.sent.push(SentDatagram {
            from,
            to,
            payload: payload.to_vec(),
        });

        let recipients: Vec<SocketAddr> = match to {
            Destination::Unicast(address) => vec![address],
            Destination::Broadcast(port) => self
                .inboxes
                .keys()
                .filter(|address| address.port() == port && **address != from)
                .copied()
                .collect(),
        };

        for recipient in recipients {
            if self.lose() {
                continue;
            }
            // nobody bound there: dropped, as UDP would
            if let Some(inbox) = self.inboxes.get_mut(&recipient) {
                inbox.push_back((from, payload.into()));
            }
        }
    }
}

/// A shared broadcast domain. Clones refer to the same network.
#[derive(Clone)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState {
                inboxes: HashMap::new(),
                sent: Vec::new(),
                loss: None,
                failing_senders: HashSet::new(),
            })),
        }
    }

    /// A network that drops each delivery with probability `rate`, reproducibly
    pub fn lossy(seed: u64, rate: f32) -> Self {
        let network = Self::new();
        network.state.lock().unwrap().loss = Some((fastrand::Rng::with_seed(seed), rate));
        network
    }

    /// Stops dropping datagrams from now on
    pub fn heal(&self) {
        self.state.lock().unwrap().loss = None;
    }

    /// Every send from `address` fails until `restore_sends_from` is called
    pub fn fail_sends_from(&self, address: SocketAddr) {
        self.state.lock().unwrap().failing_senders.insert(address);
    }

    pub fn restore_sends_from(&self, address: &SocketAddr) {
        self.state.lock().unwrap().failing_senders.remove(address);
    }

    /// Address of host number `host` on this network
    pub fn host(host: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, host))
    }

    /// Binds a coordinator socket at `(ip, port)`
    pub fn coordinator_socket(
        &self,
        ip: IpAddr,
        port: u16,
    ) -> (
        Box<dyn CoordinatorPacketSender>,
        Box<dyn CoordinatorPacketReceiver>,
    ) {
        let address = SocketAddr::new(ip, port);
        self.bind(address);

        let sender = LocalCoordinatorSender {
            network: self.clone(),
            address,
        };
        let receiver = LocalCoordinatorReceiver {
            network: self.clone(),
            address,
            current_payload: None,
        };
        (Box::new(sender), Box::new(receiver))
    }

    /// An unbound unit socket on host `ip`
    pub fn unit_socket(&self, ip: IpAddr) -> LocalUnitSocket {
        LocalUnitSocket {
            network: self.clone(),
            ip,
            address: None,
            current_payload: None,
        }
    }

    /// Delivers a raw datagram as if `from` had sent it
    pub fn inject(&self, from: SocketAddr, to: Destination, payload: &[u8]) {
        self.state.lock().unwrap().deliver(from, to, payload);
    }

    pub fn is_bound(&self, address: &SocketAddr) -> bool {
        self.state.lock().unwrap().inboxes.contains_key(address)
    }

    /// Datagrams waiting at `address`
    pub fn pending(&self, address: &SocketAddr) -> usize {
        self.state
            .lock()
            .unwrap()
            .inboxes
            .get(address)
            .map_or(0, |inbox| inbox.len())
    }

    /// Everything sent since the last call
    pub fn take_sent(&self) -> Vec<SentDatagram> {
        std::mem::take(&mut self.state.lock().unwrap().sent)
    }

    /// Decodable frames sent since the last call
    pub fn take_sent_frames(&self) -> Vec<(SocketAddr, Destination, Frame)> {
        self.take_sent()
            .into_iter()
            .filter_map(|datagram| {
                let frame = datagram.frame().ok()?;
                Some((datagram.from, datagram.to, frame))
            })
            .collect()
    }

    /// Returns false if sends from `from` are set to fail
    fn send(&self, from: SocketAddr, to: Destination, payload: &[u8]) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.failing_senders.contains(&from) {
            return false;
        }
        state.deliver(from, to, payload);
        true
    }

    fn pop(&self, address: &SocketAddr) -> Option<(SocketAddr, Box<[u8]>)> {
        self.state
            .lock()
            .unwrap()
            .inboxes
            .get_mut(address)?
            .pop_front()
    }

    fn bind(&self, address: SocketAddr) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.inboxes.contains_key(&address) {
            return false;
        }
        state.inboxes.insert(address, VecDeque::new());
        true
    }

    fn bind_ephemeral(&self, ip: IpAddr) -> Option<SocketAddr> {
        let mut state = self.state.lock().unwrap();
        let address = (EPHEMERAL_PORT_START..=u16::MAX)
            .map(|port| SocketAddr::new(ip, port))
            .find(|address| !state.inboxes.contains_key(address))?;
        state.inboxes.insert(address, VecDeque::new());
        Some(address)
    }

    fn unbind(&self, address: &SocketAddr) {
        self.state.lock().unwrap().inboxes.remove(address);
    }
}

// Coordinator Socket Components

#[derive(Clone)]
struct LocalCoordinatorSender {
    network: LocalNetwork,
    address: SocketAddr,
}

impl CoordinatorPacketSender for LocalCoordinatorSender {
    fn send(&self, address: &SocketAddr, payload: &[u8]) -> Result<(), CoordinatorSendError> {
        if self
            .network
            .send(self.address, Destination::Unicast(*address), payload)
        {
            Ok(())
        } else {
            Err(CoordinatorSendError)
        }
    }

    fn broadcast(&self, port: u16, payload: &[u8]) -> Result<(), CoordinatorSendError> {
        if self
            .network
            .send(self.address, Destination::Broadcast(port), payload)
        {
            Ok(())
        } else {
            Err(CoordinatorSendError)
        }
    }
}

struct LocalCoordinatorReceiver {
    network: LocalNetwork,
    address: SocketAddr,
    current_payload: Option<Box<[u8]>>,
}

impl CoordinatorPacketReceiver for LocalCoordinatorReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, CoordinatorRecvError> {
        let Some((from, payload)) = self.network.pop(&self.address) else {
            return Ok(None);
        };
        let payload: &[u8] = self.current_payload.insert(payload);
        Ok(Some((from, payload)))
    }
}

// Unit Socket Components

/// A unit's socket on the local network. Listening on a port binds
/// `(host ip, port)` and releases the previous binding; port 0 picks the
/// lowest free ephemeral port on the host.
pub struct LocalUnitSocket {
    network: LocalNetwork,
    ip: IpAddr,
    address: Option<SocketAddr>,
    current_payload: Option<Box<[u8]>>,
}

impl LocalUnitSocket {
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }
}

impl Drop for LocalUnitSocket {
    fn drop(&mut self) {
        if let Some(address) = self.address.take() {
            self.network.unbind(&address);
        }
    }
}

impl UnitSocket for LocalUnitSocket {
    fn listen(&mut self, port: u16) -> Result<(), UnitError> {
        if let Some(address) = self.address.take() {
            self.network.unbind(&address);
        }
        let bound = if port == 0 {
            self.network.bind_ephemeral(self.ip)
        } else {
            let address = SocketAddr::new(self.ip, port);
            self.network.bind(address).then_some(address)
        };
        let Some(address) = bound else {
            return Err(UnitError::Bind {
                port,
                reason: "address already in use".to_string(),
            });
        };
        self.address = Some(address);
        Ok(())
    }

    fn local_port(&self) -> Option<u16> {
        self.address.map(|address| address.port())
    }

    fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), UnitSendError> {
        let Some(from) = self.address else {
            return Err(UnitSendError);
        };
        if self.network.send(from, Destination::Unicast(*address), payload) {
            Ok(())
        } else {
            Err(UnitSendError)
        }
    }

    fn broadcast(&mut self, port: u16, payload: &[u8]) -> Result<(), UnitSendError> {
        let Some(from) = self.address else {
            return Err(UnitSendError);
        };
        if self.network.send(from, Destination::Broadcast(port), payload) {
            Ok(())
        } else {
            Err(UnitSendError)
        }
    }

    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, UnitRecvError> {
        let Some(address) = self.address else {
            return Ok(None);
        };
        let Some((from, payload)) = self.network.pop(&address) else {
            return Ok(None);
        };
        let payload: &[u8] = self.current_payload.insert(payload);
        Ok(Some((from, payload)))
    }
}
