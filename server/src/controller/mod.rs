use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use minibot_shared::{ButtonSet, Instant};

/// Identity of a physical controller, as assigned by whatever enumerates the
/// input devices. Used only as a lookup key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(pub u32);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller {}", self.0)
    }
}

/// One polled input-device reading. Axes are normalized to -1.0..=1.0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerSample {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub buttons: ButtonSet,
    pub sampled_at: Instant,
}

impl ControllerSample {
    pub fn new(axes: [f32; 4], buttons: ButtonSet, sampled_at: Instant) -> Self {
        let [left_x, left_y, right_x, right_y] = axes;
        Self {
            left_x,
            left_y,
            right_x,
            right_y,
            buttons,
            sampled_at,
        }
    }

    /// Centered sticks, nothing pressed
    pub fn neutral(sampled_at: Instant) -> Self {
        Self::new([0.0; 4], ButtonSet::empty(), sampled_at)
    }

    pub fn axes(&self) -> [f32; 4] {
        [self.left_x, self.left_y, self.right_x, self.right_y]
    }
}

/// Input-device sampler consulted once per dispatch tick for every paired
/// controller. Returning `None` means the controller is gone, which clears
/// its pairing.
pub trait ControllerSource {
    fn sample(&mut self, controller: &ControllerId, now: &Instant) -> Option<ControllerSample>;
}

impl ControllerSource for HashMap<ControllerId, ControllerSample> {
    fn sample(&mut self, controller: &ControllerId, _now: &Instant) -> Option<ControllerSample> {
        self.get(controller).copied()
    }
}

/// Lets the dispatch thread share a source with whatever feeds it samples
impl<T: ControllerSource> ControllerSource for Arc<Mutex<T>> {
    fn sample(&mut self, controller: &ControllerId, now: &Instant) -> Option<ControllerSample> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sample(controller, now)
    }
}
