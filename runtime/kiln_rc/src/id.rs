//! Stable proxy identity.

use std::fmt;

/// Identity of one proxy record.
///
/// `slot` indexes the pool's block storage, `generation` counts how many
/// times that slot has been handed out, and `epoch` identifies the pool
/// storage instance. Epochs are unique across every pool in the process.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProxyId {
    epoch: u32,
    slot: u32,
    generation: u32,
}

impl ProxyId {
    #[inline]
    pub(crate) const fn new(epoch: u32, slot: u32, generation: u32) -> Self {
        Self {
            epoch,
            slot,
            generation,
        }
    }

    /// Pool storage instance this proxy was allocated from.
    #[inline]
    pub const fn epoch(self) -> u32 {
        self.epoch
    }

    /// Slot index within the pool's blocks.
    #[inline]
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// How many times the slot had been reused when this id was issued.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProxyId({}:{}#{})",
            self.epoch, self.slot, self.generation
        )
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy {}:{}#{}", self.epoch, self.slot, self.generation)
    }
}

kiln_ir::static_assert_size!(ProxyId, 12);
