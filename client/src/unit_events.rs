use std::{net::SocketAddr, vec::IntoIter};

use minibot_shared::SessionMode;

use crate::UnitError;

/// Everything that happened to a RemoteUnit during one update
pub struct UnitEvents {
    assignments: Vec<(u16, SocketAddr)>,
    timeouts: usize,
    mode_changes: Vec<SessionMode>,
    emergency_stops: Vec<bool>,
    errors: Vec<UnitError>,
    empty: bool,
}

impl Default for UnitEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitEvents {
    pub(crate) fn new() -> Self {
        Self {
            assignments: Vec::new(),
            timeouts: 0,
            mode_changes: Vec::new(),
            emergency_stops: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: UnitEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: UnitEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_assignment(&mut self, channel: u16, coordinator: SocketAddr) {
        self.assignments.push((channel, coordinator));
        self.empty = false;
    }

    pub(crate) fn push_timeout(&mut self) {
        self.timeouts += 1;
        self.empty = false;
    }

    pub(crate) fn push_mode_change(&mut self, mode: SessionMode) {
        self.mode_changes.push(mode);
        self.empty = false;
    }

    pub(crate) fn push_emergency_stop(&mut self, active: bool) {
        self.emergency_stops.push(active);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: UnitError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait UnitEvent {
    type Iter;

    fn iter(events: &mut UnitEvents) -> Self::Iter;

    fn has(events: &UnitEvents) -> bool;
}

// AssignEvent
/// The unit took a channel: (channel, coordinator address)
pub struct AssignEvent;
impl UnitEvent for AssignEvent {
    type Iter = IntoIter<(u16, SocketAddr)>;

    fn iter(events: &mut UnitEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.assignments);
        IntoIterator::into_iter(list)
    }

    fn has(events: &UnitEvents) -> bool {
        !events.assignments.is_empty()
    }
}

// TimeoutEvent
/// The command channel went silent and the unit is advertising again
pub struct TimeoutEvent;
impl UnitEvent for TimeoutEvent {
    type Iter = IntoIter<()>;

    fn iter(events: &mut UnitEvents) -> Self::Iter {
        let count = std::mem::take(&mut events.timeouts);
        IntoIterator::into_iter(vec![(); count])
    }

    fn has(events: &UnitEvents) -> bool {
        events.timeouts > 0
    }
}

// ModeEvent
pub struct ModeEvent;
impl UnitEvent for ModeEvent {
    type Iter = IntoIter<SessionMode>;

    fn iter(events: &mut UnitEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.mode_changes);
        IntoIterator::into_iter(list)
    }

    fn has(events: &UnitEvents) -> bool {
        !events.mode_changes.is_empty()
    }
}

// EmergencyStopEvent
/// `true` when the stop was engaged, `false` when released
pub struct EmergencyStopEvent;
impl UnitEvent for EmergencyStopEvent {
    type Iter = IntoIter<bool>;

    fn iter(events: &mut UnitEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.emergency_stops);
        IntoIterator::into_iter(list)
    }

    fn has(events: &UnitEvents) -> bool {
        !events.emergency_stops.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl UnitEvent for ErrorEvent {
    type Iter = IntoIter<UnitError>;

    fn iter(events: &mut UnitEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &UnitEvents) -> bool {
        !events.errors.is_empty()
    }
}
