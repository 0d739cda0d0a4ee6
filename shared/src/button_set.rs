/// Face buttons carried in the low byte of a control frame's button field
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Cross,
    Circle,
    Square,
    Triangle,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Cross, Button::Circle, Button::Square, Button::Triangle];

    /// Bit position of this button inside the 16-bit set
    pub fn bit(&self) -> u8 {
        match self {
            Button::Cross => 0,
            Button::Circle => 1,
            Button::Square => 2,
            Button::Triangle => 3,
        }
    }

    fn mask(&self) -> u16 {
        1 << self.bit()
    }
}

/// Fixed-width, order-significant button bitset. Travels little-endian.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet(u16);

impl ButtonSet {
    pub fn new(bits: u16) -> Self {
        Self(bits)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.0 |= button.mask();
        } else {
            self.0 &= !button.mask();
        }
    }

    /// Builder form of [`ButtonSet::set`] with `pressed = true`
    pub fn with(mut self, button: Button) -> Self {
        self.set(button, true);
        self
    }

    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL
            .into_iter()
            .filter(move |button| self.is_pressed(*button))
    }

    pub fn to_le_bytes(&self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}
