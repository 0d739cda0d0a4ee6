use std::collections::HashMap;

use minibot_shared::UnitId;

use crate::controller::ControllerId;

/// One-to-one relation between remote units and controllers. Both sides are
/// plain lookup keys; neither owns the other.
#[derive(Clone, Debug, Default)]
pub struct Pairing {
    by_unit: HashMap<UnitId, ControllerId>,
    by_controller: HashMap<ControllerId, UnitId>,
}

impl Pairing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `unit_id` with `controller`, first breaking any pairing either of
    /// them already has
    pub fn pair(&mut self, unit_id: &UnitId, controller: ControllerId) {
        self.unpair_unit(unit_id);
        self.unpair_controller(&controller);
        self.by_unit.insert(unit_id.clone(), controller);
        self.by_controller.insert(controller, unit_id.clone());
    }

    pub fn unpair_unit(&mut self, unit_id: &UnitId) -> Option<ControllerId> {
        let controller = self.by_unit.remove(unit_id)?;
        self.by_controller.remove(&controller);
        Some(controller)
    }

    pub fn unpair_controller(&mut self, controller: &ControllerId) -> Option<UnitId> {
        let unit_id = self.by_controller.remove(controller)?;
        self.by_unit.remove(&unit_id);
        Some(unit_id)
    }

    /// Removes the pairing only if `unit_id` is still paired with `controller`
    pub fn unpair_exact(&mut self, unit_id: &UnitId, controller: &ControllerId) -> bool {
        if self.by_unit.get(unit_id) != Some(controller) {
            return false;
        }
        self.unpair_unit(unit_id);
        true
    }

    pub fn controller_for(&self, unit_id: &UnitId) -> Option<ControllerId> {
        self.by_unit.get(unit_id).copied()
    }

    pub fn unit_for(&self, controller: &ControllerId) -> Option<&UnitId> {
        self.by_controller.get(controller)
    }

    pub fn len(&self) -> usize {
        self.by_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_unit.clear();
        self.by_controller.clear();
    }
}
