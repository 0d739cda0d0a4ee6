use std::{mem, net::SocketAddr, vec::IntoIter};

use minibot_shared::UnitId;

use crate::{controller::ControllerId, CoordinatorError};

/// Everything that happened during one receive, reap or dispatch pass
pub struct CoordinatorEvents {
    discoveries: Vec<(UnitId, SocketAddr, u16)>,
    reassignments: Vec<(UnitId, SocketAddr, u16)>,
    evictions: Vec<(UnitId, Option<ControllerId>)>,
    unpairings: Vec<(UnitId, ControllerId)>,
    errors: Vec<CoordinatorError>,

    empty: bool,
}

impl Default for CoordinatorEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorEvents {
    pub fn new() -> Self {
        Self {
            discoveries: Vec::new(),
            reassignments: Vec::new(),
            evictions: Vec::new(),
            unpairings: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: CoordinatorEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: CoordinatorEvent>(&self) -> bool {
        V::has(self)
    }

    /// Moves every event of `other` onto the end of this collection
    pub fn append(&mut self, other: &mut CoordinatorEvents) {
        if other.empty {
            return;
        }
        self.discoveries.append(&mut other.discoveries);
        self.reassignments.append(&mut other.reassignments);
        self.evictions.append(&mut other.evictions);
        self.unpairings.append(&mut other.unpairings);
        self.errors.append(&mut other.errors);
        other.empty = true;
        self.empty = false;
    }

    // Crate-public

    /// Keeps only the newest `max_per_kind` events of each kind, returning
    /// how many were dropped
    pub(crate) fn retain_newest(&mut self, max_per_kind: usize) -> usize {
        fn trim<T>(list: &mut Vec<T>, max: usize) -> usize {
            let excess = list.len().saturating_sub(max);
            list.drain(..excess);
            excess
        }

        let dropped = trim(&mut self.discoveries, max_per_kind)
            + trim(&mut self.reassignments, max_per_kind)
            + trim(&mut self.evictions, max_per_kind)
            + trim(&mut self.unpairings, max_per_kind)
            + trim(&mut self.errors, max_per_kind);
        if max_per_kind == 0 {
            self.empty = true;
        }
        dropped
    }

    pub(crate) fn push_discovery(&mut self, unit_id: &UnitId, source: SocketAddr, channel: u16) {
        self.discoveries.push((unit_id.clone(), source, channel));
        self.empty = false;
    }

    pub(crate) fn push_reassignment(&mut self, unit_id: &UnitId, source: SocketAddr, channel: u16) {
        self.reassignments.push((unit_id.clone(), source, channel));
        self.empty = false;
    }

    pub(crate) fn push_eviction(&mut self, unit_id: &UnitId, controller: Option<ControllerId>) {
        self.evictions.push((unit_id.clone(), controller));
        self.empty = false;
    }

    pub(crate) fn push_unpairing(&mut self, unit_id: &UnitId, controller: ControllerId) {
        self.unpairings.push((unit_id.clone(), controller));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: CoordinatorError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait CoordinatorEvent {
    type Iter;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter;

    fn has(events: &CoordinatorEvents) -> bool;
}

// DiscoverEvent
/// A new unit was registered: (id, observed source, assigned channel)
pub struct DiscoverEvent;
impl CoordinatorEvent for DiscoverEvent {
    type Iter = IntoIter<(UnitId, SocketAddr, u16)>;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter {
        let list = mem::take(&mut events.discoveries);
        IntoIterator::into_iter(list)
    }

    fn has(events: &CoordinatorEvents) -> bool {
        !events.discoveries.is_empty()
    }
}

// ReassignEvent
/// A known unit announced again and got its existing channel retransmitted
pub struct ReassignEvent;
impl CoordinatorEvent for ReassignEvent {
    type Iter = IntoIter<(UnitId, SocketAddr, u16)>;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter {
        let list = mem::take(&mut events.reassignments);
        IntoIterator::into_iter(list)
    }

    fn has(events: &CoordinatorEvents) -> bool {
        !events.reassignments.is_empty()
    }
}

// EvictEvent
pub struct EvictEvent;
impl CoordinatorEvent for EvictEvent {
    type Iter = IntoIter<(UnitId, Option<ControllerId>)>;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter {
        let list = mem::take(&mut events.evictions);
        IntoIterator::into_iter(list)
    }

    fn has(events: &CoordinatorEvents) -> bool {
        !events.evictions.is_empty()
    }
}

// UnpairEvent
/// A pairing was cleared because the controller disappeared
pub struct UnpairEvent;
impl CoordinatorEvent for UnpairEvent {
    type Iter = IntoIter<(UnitId, ControllerId)>;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter {
        let list = mem::take(&mut events.unpairings);
        IntoIterator::into_iter(list)
    }

    fn has(events: &CoordinatorEvents) -> bool {
        !events.unpairings.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl CoordinatorEvent for ErrorEvent {
    type Iter = IntoIter<CoordinatorError>;

    fn iter(events: &mut CoordinatorEvents) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &CoordinatorEvents) -> bool {
        !events.errors.is_empty()
    }
}
