use std::collections::BTreeSet;

/// Hands out command channels from `base..base + count`, always the lowest
/// free one. Channel 0 is never handed out.
#[derive(Clone, Debug)]
pub struct ChannelAllocator {
    base: u16,
    count: u16,
    in_use: BTreeSet<u16>,
}

impl ChannelAllocator {
    pub fn new(base: u16, count: u16) -> Self {
        // port 0 can never be assigned over the wire
        let base = base.max(1);
        // never run past the last port number
        let count = count.min((u16::MAX - base).saturating_add(1));
        Self {
            base,
            count,
            in_use: BTreeSet::new(),
        }
    }

    pub fn allocate(&mut self) -> Option<u16> {
        let channel = (0..self.count)
            .map(|offset| self.base + offset)
            .find(|channel| !self.in_use.contains(channel))?;
        self.in_use.insert(channel);
        Some(channel)
    }

    pub fn release(&mut self, channel: u16) {
        self.in_use.remove(&channel);
    }

    pub fn clear(&mut self) {
        self.in_use.clear();
    }

    pub fn is_in_use(&self, channel: u16) -> bool {
        self.in_use.contains(&channel)
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn count(&self) -> u16 {
        self.count
    }
}
