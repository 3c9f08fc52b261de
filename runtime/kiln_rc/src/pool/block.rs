//! Fixed-size block storage backing a proxy pool.

use std::sync::Arc;

use crate::ProxyId;

/// One reference-count proxy record.
pub(super) struct Proxy<T> {
    /// Bumped every time the slot goes back on the free list.
    pub(super) generation: u32,
    pub(super) in_use: bool,
    pub(super) strong: u32,
    pub(super) weak: u32,
    /// Link to the owned object; cleared once the strong count hits zero.
    pub(super) object: Option<Arc<T>>,
}

impl<T> Proxy<T> {
    fn vacant() -> Self {
        Self {
            generation: 0,
            in_use: false,
            strong: 0,
            weak: 0,
            object: None,
        }
    }
}

/// Block allocator: proxies are never moved or freed individually, only
/// recycled through the free list until the whole storage is dropped.
pub(super) struct BlockStorage<T> {
    epoch: u32,
    block_size: usize,
    blocks: Vec<Box<[Proxy<T>]>>,
    /// Free slot indices; popped from the back.
    free: Vec<u32>,
    in_use: usize,
}

impl<T> BlockStorage<T> {
    pub(super) fn new(epoch: u32, block_size: usize) -> Self {
        Self {
            epoch,
            block_size,
            blocks: Vec::new(),
            free: Vec::new(),
            in_use: 0,
        }
    }

    #[inline]
    pub(super) fn epoch(&self) -> u32 {
        self.epoch
    }

    #[inline]
    pub(super) fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.blocks.len() * self.block_size
    }

    #[inline]
    pub(super) fn in_use(&self) -> usize {
        self.in_use
    }

    #[inline]
    pub(super) fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Append one block and put its slots on the free list.
    fn grow(&mut self) {
        let base = self.capacity();
        let end = base + self.block_size;
        let (Ok(base), Ok(end)) = (u32::try_from(base), u32::try_from(end)) else {
            panic!("proxy pool exhausted the 32-bit slot space ({base} slots)");
        };

        let block: Box<[Proxy<T>]> = (0..self.block_size).map(|_| Proxy::vacant()).collect();
        self.blocks.push(block);

        // Reverse so the lowest slot of the new block is handed out first.
        self.free.extend((base..end).rev());

        tracing::trace!(
            epoch = self.epoch,
            blocks = self.blocks.len(),
            capacity = self.capacity(),
            "proxy pool grew by one block"
        );
    }

    /// Take a free proxy, growing by one block if none is left.
    pub(super) fn take(&mut self) -> ProxyId {
        if self.free.is_empty() {
            self.grow();
        }
        let Some(slot) = self.free.pop() else {
            unreachable!("grow() always refills the free list");
        };

        let proxy = self.slot_mut(slot);
        debug_assert!(!proxy.in_use, "free list handed out a live proxy");
        proxy.in_use = true;
        proxy.strong = 0;
        proxy.weak = 0;
        let generation = proxy.generation;

        self.in_use += 1;
        ProxyId::new(self.epoch, slot, generation)
    }

    /// Return a proxy to the free list.
    ///
    /// Returns the object link the proxy still held, so the caller can drop
    /// it outside of any lock.
    pub(super) fn give_back(&mut self, id: ProxyId) -> Option<Arc<T>> {
        let proxy = self.slot_mut(id.slot());
        assert!(
            proxy.in_use && proxy.generation == id.generation(),
            "{id} released but it is not checked out of the pool"
        );
        proxy.in_use = false;
        proxy.strong = 0;
        proxy.weak = 0;
        proxy.generation = proxy.generation.wrapping_add(1);
        let object = proxy.object.take();

        self.in_use -= 1;
        self.free.push(id.slot());
        object
    }

    /// Get the live proxy named by `id`, or `None` if the id is stale.
    pub(super) fn get_mut(&mut self, id: ProxyId) -> Option<&mut Proxy<T>> {
        if id.epoch() != self.epoch {
            return None;
        }
        let block_size = self.block_size;
        let slot = id.slot() as usize;
        let proxy = self
            .blocks
            .get_mut(slot / block_size)?
            .get_mut(slot % block_size)?;
        (proxy.in_use && proxy.generation == id.generation()).then_some(proxy)
    }

    fn slot_mut(&mut self, slot: u32) -> &mut Proxy<T> {
        let slot = slot as usize;
        &mut self.blocks[slot / self.block_size][slot % self.block_size]
    }
}
