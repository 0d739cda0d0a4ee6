use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use minibot_shared::{Instant, SessionMode, UnitId};

use crate::{
    controller::ControllerId,
    registry::{channel_allocator::ChannelAllocator, pairing::Pairing, record::RemoteUnitRecord},
    CoordinatorError,
};

/// Result of feeding an announcement into the Registry
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Announcement {
    /// First announcement from this id; a fresh channel was allocated
    Discovered { channel: u16 },
    /// Id already known; its existing channel must be retransmitted
    Known { channel: u16 },
}

impl Announcement {
    pub fn channel(&self) -> u16 {
        match self {
            Announcement::Discovered { channel } | Announcement::Known { channel } => *channel,
        }
    }
}

/// A unit removed by the reaper, with the controller it was paired to
#[derive(Clone, Debug, PartialEq)]
pub struct EvictedUnit {
    pub record: RemoteUnitRecord,
    pub controller: Option<ControllerId>,
}

/// Snapshot of what the dispatcher needs to know about one unit for one tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchTarget {
    pub unit_id: UnitId,
    pub command_address: SocketAddr,
    pub mode: SessionMode,
    pub controller: Option<ControllerId>,
}

/// The single authoritative map of known units, plus the Pairing relation and
/// the coordinator-wide emergency stop latch
pub struct Registry {
    records: HashMap<UnitId, RemoteUnitRecord>,
    pairing: Pairing,
    channels: ChannelAllocator,
    default_mode: SessionMode,
    emergency_stop: bool,
}

impl Registry {
    pub fn new(command_port_base: u16, channel_count: u16) -> Self {
        Self {
            records: HashMap::new(),
            pairing: Pairing::new(),
            channels: ChannelAllocator::new(command_port_base, channel_count),
            default_mode: SessionMode::Standby,
            emergency_stop: false,
        }
    }

    // Announcements & heartbeats

    /// Records an announcement observed from `source_address`. Known ids keep
    /// their channel; unknown ids get the lowest free one.
    pub fn announce(
        &mut self,
        unit_id: &UnitId,
        source_address: SocketAddr,
        reported_address: &str,
        now: &Instant,
    ) -> Result<Announcement, CoordinatorError> {
        if let Some(record) = self.records.get_mut(unit_id) {
            record.refresh_announce(source_address, reported_address, now);
            return Ok(Announcement::Known {
                channel: record.assigned_channel(),
            });
        }

        let Some(channel) = self.channels.allocate() else {
            return Err(CoordinatorError::ChannelsExhausted {
                unit_id: unit_id.clone(),
                base: self.channels.base(),
                count: self.channels.count(),
            });
        };

        let record = RemoteUnitRecord::new(
            unit_id.clone(),
            source_address,
            reported_address,
            channel,
            self.default_mode,
            now,
        );
        self.records.insert(unit_id.clone(), record);

        Ok(Announcement::Discovered { channel })
    }

    /// Records a heartbeat from an assigned unit. Returns false for unknown ids.
    pub fn acknowledge(&mut self, unit_id: &UnitId, now: &Instant) -> bool {
        let Some(record) = self.records.get_mut(unit_id) else {
            return false;
        };
        record.refresh_ack(now);
        true
    }

    // Eviction

    /// Removes every record not heard from for longer than `eviction_timeout`,
    /// clearing pairings and freeing channels in the same step
    pub fn evict_stale(&mut self, now: &Instant, eviction_timeout: Duration) -> Vec<EvictedUnit> {
        let stale: Vec<UnitId> = self
            .records
            .values()
            .filter(|record| record.is_stale(now, eviction_timeout))
            .map(|record| record.id().clone())
            .collect();

        stale
            .iter()
            .filter_map(|unit_id| self.remove(unit_id))
            .collect()
    }

    pub fn remove(&mut self, unit_id: &UnitId) -> Option<EvictedUnit> {
        let record = self.records.remove(unit_id)?;
        self.channels.release(record.assigned_channel());
        let controller = self.pairing.unpair_unit(unit_id);
        Some(EvictedUnit { record, controller })
    }

    /// Forgets every unit and pairing, as an operator refresh does
    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        self.pairing.clear();
        self.channels.clear();
        count
    }

    // Pairing

    pub fn pair(&mut self, unit_id: &UnitId, controller: ControllerId) -> Result<(), CoordinatorError> {
        if !self.records.contains_key(unit_id) {
            return Err(CoordinatorError::UnknownUnit {
                unit_id: unit_id.clone(),
            });
        }
        self.pairing.pair(unit_id, controller);
        Ok(())
    }

    pub fn unpair_unit(&mut self, unit_id: &UnitId) -> Option<ControllerId> {
        self.pairing.unpair_unit(unit_id)
    }

    pub fn unpair_controller(&mut self, controller: &ControllerId) -> Option<UnitId> {
        self.pairing.unpair_controller(controller)
    }

    pub fn unpair_exact(&mut self, unit_id: &UnitId, controller: &ControllerId) -> bool {
        self.pairing.unpair_exact(unit_id, controller)
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    // Modes & emergency stop

    /// Sets one unit's mode, returning its command address
    pub fn set_mode(
        &mut self,
        unit_id: &UnitId,
        mode: SessionMode,
    ) -> Result<SocketAddr, CoordinatorError> {
        let Some(record) = self.records.get_mut(unit_id) else {
            return Err(CoordinatorError::UnknownUnit {
                unit_id: unit_id.clone(),
            });
        };
        record.set_mode(mode);
        Ok(record.command_address())
    }

    /// Sets every unit's mode, and the mode future units start in
    pub fn set_mode_all(&mut self, mode: SessionMode) -> Vec<(UnitId, SocketAddr)> {
        self.default_mode = mode;
        self.records
            .values_mut()
            .map(|record| {
                record.set_mode(mode);
                (record.id().clone(), record.command_address())
            })
            .collect()
    }

    pub fn default_mode(&self) -> SessionMode {
        self.default_mode
    }

    pub fn set_emergency_stop(&mut self, active: bool) {
        self.emergency_stop = active;
    }

    pub fn emergency_stop_active(&self) -> bool {
        self.emergency_stop
    }

    // Queries

    pub fn get(&self, unit_id: &UnitId) -> Option<&RemoteUnitRecord> {
        self.records.get(unit_id)
    }

    pub fn contains(&self, unit_id: &UnitId) -> bool {
        self.records.contains_key(unit_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &RemoteUnitRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (source address, command address) of every unit, for fan-out frames
    pub fn unit_addresses(&self) -> Vec<(SocketAddr, SocketAddr)> {
        self.records
            .values()
            .map(|record| (record.source_address(), record.command_address()))
            .collect()
    }

    pub fn dispatch_targets(&self) -> Vec<DispatchTarget> {
        self.records
            .values()
            .map(|record| DispatchTarget {
                unit_id: record.id().clone(),
                command_address: record.command_address(),
                mode: record.mode(),
                controller: self.pairing.controller_for(record.id()),
            })
            .collect()
    }
}

/// The Registry behind the one Mutex every coordinator loop goes through
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Locks the Registry. A panic in another holder does not leave the map
    /// half-written (every mutation completes before returning), so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
