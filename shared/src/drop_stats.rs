/// Why a received datagram was thrown away
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Did not decode into any frame
    Malformed,
    /// Decoded fine, but is not a frame this side accepts in its current state
    Unexpected,
    /// Names a unit this side does not know or is not
    ForeignUnit,
}

/// Counters for silently dropped datagrams. Drops never surface as errors;
/// these counters are the only record of them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DropStats {
    pub malformed: u64,
    pub unexpected: u64,
    pub foreign_unit: u64,
}

impl DropStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: DropReason) {
        let counter = match reason {
            DropReason::Malformed => &mut self.malformed,
            DropReason::Unexpected => &mut self.unexpected,
            DropReason::ForeignUnit => &mut self.foreign_unit,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.malformed
            .saturating_add(self.unexpected)
            .saturating_add(self.foreign_unit)
    }
}
