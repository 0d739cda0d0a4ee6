use minibot_shared::{ButtonSet, ControlFrame};

/// One control frame's worth of input, decoded back to normalized axes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriveCommand {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub buttons: ButtonSet,
}

impl DriveCommand {
    pub fn neutral() -> Self {
        Self {
            left_x: 0.0,
            left_y: 0.0,
            right_x: 0.0,
            right_y: 0.0,
            buttons: ButtonSet::empty(),
        }
    }

    pub fn axes(&self) -> [f32; 4] {
        [self.left_x, self.left_y, self.right_x, self.right_y]
    }
}

impl From<&ControlFrame> for DriveCommand {
    fn from(frame: &ControlFrame) -> Self {
        let [left_x, left_y, right_x, right_y] = frame.normalized_axes();
        Self {
            left_x,
            left_y,
            right_x,
            right_y,
            buttons: frame.buttons,
        }
    }
}

/// Whatever turns drive commands into motion. `stop` must leave every output
/// at neutral and is called before any other reaction to a timeout or an
/// emergency stop.
pub trait ActuatorSink {
    fn apply(&mut self, command: &DriveCommand);

    fn stop(&mut self);
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for Box<T> {
    fn apply(&mut self, command: &DriveCommand) {
        (**self).apply(command);
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}
