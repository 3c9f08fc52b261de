//! Process-lifetime pool of reference-count proxies.
//!
//! A [`ProxyPool`] is an explicit context value: the owner of an object
//! class creates one pool and hands clones of it to whoever needs to mint
//! handles. Clones share the same storage.

mod block;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;

use crate::ProxyId;
use block::BlockStorage;

/// Number of proxies allocated per block.
pub const POOL_BLOCK_SIZE: usize = 1024;

/// Pool construction options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Proxies per block; the pool grows one block at a time.
    pub block_size: usize,
    /// Keep the set of checked-out proxies for leak auditing.
    ///
    /// Turns double release and release of never-allocated proxies into
    /// immediate panics.
    pub track_active: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: POOL_BLOCK_SIZE,
            track_active: cfg!(debug_assertions),
        }
    }
}

/// Point-in-time view of a pool's allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Storage epoch, `None` while the pool is uninitialized.
    pub epoch: Option<u32>,
    pub blocks: usize,
    pub capacity: usize,
    pub in_use: usize,
    pub free: usize,
}

/// Source of storage epochs for every pool in the process.
///
/// Epochs are never shared between pools, so a [`ProxyId`] names exactly one
/// storage instance and a pool rejects ids minted by any other pool.
static NEXT_EPOCH: AtomicU32 = AtomicU32::new(0);

/// Pooled allocator of reference-count proxies for objects of type `T`.
pub struct ProxyPool<T> {
    inner: Arc<PoolInner<T>>,
}

struct PoolInner<T> {
    /// Short label used in log events ("type", "object", ...).
    label: &'static str,
    config: PoolConfig,
    /// `None` until the first allocation and again after shutdown.
    storage: Mutex<Option<BlockStorage<T>>>,
    /// Checked-out proxies, maintained only when `config.track_active`.
    active: DashSet<ProxyId, FxBuildHasher>,
}

impl<T> ProxyPool<T> {
    /// Create a pool with the default configuration.
    pub fn new(label: &'static str) -> Self {
        Self::with_config(label, PoolConfig::default())
    }

    /// Create a pool with explicit block size and tracking options.
    ///
    /// No storage is allocated until the first [`allocate`](Self::allocate).
    pub fn with_config(label: &'static str, config: PoolConfig) -> Self {
        assert!(config.block_size > 0, "proxy pool block size must be non-zero");
        Self {
            inner: Arc::new(PoolInner {
                label,
                config,
                storage: Mutex::new(None),
                active: DashSet::with_hasher(FxBuildHasher),
            }),
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    #[inline]
    pub fn config(&self) -> PoolConfig {
        self.inner.config
    }

    /// Whether the diagnostic active set is maintained.
    #[inline]
    pub fn tracks_active(&self) -> bool {
        self.inner.config.track_active
    }

    /// Check whether two handles refer to the same pool.
    #[inline]
    pub fn same_pool(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Draw one proxy from the pool.
    ///
    /// Initializes the storage on first use and grows it by one block when
    /// no free proxy is left. The returned proxy has zero strong and weak
    /// counts and no object attached.
    pub fn allocate(&self) -> ProxyId {
        let id = {
            let mut guard = self.inner.storage.lock();
            let storage = guard.get_or_insert_with(|| {
                let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    pool = self.inner.label,
                    epoch,
                    block_size = self.inner.config.block_size,
                    "proxy pool initialized"
                );
                BlockStorage::new(epoch, self.inner.config.block_size)
            });
            storage.take()
        };

        if self.inner.config.track_active {
            assert!(
                self.inner.active.insert(id),
                "{id} handed out twice by the {} pool",
                self.inner.label
            );
        }

        id
    }

    /// Return a proxy to the pool for reuse.
    ///
    /// Each allocated proxy must be released exactly once; releasing a
    /// proxy that is not checked out panics.
    pub fn release(&self, id: ProxyId) {
        if self.inner.config.track_active {
            assert!(
                self.inner.active.remove(&id).is_some(),
                "{id} released to the {} pool but it is not active",
                self.inner.label
            );
        }

        let leftover = {
            let mut guard = self.inner.storage.lock();
            let Some(storage) = guard.as_mut() else {
                panic!("{id} released to the uninitialized {} pool", self.inner.label);
            };
            assert!(
                storage.epoch() == id.epoch(),
                "{id} released to the {} pool, which did not issue it",
                self.inner.label
            );
            storage.give_back(id)
        };

        drop(leftover);
    }

    /// Destroy the pool storage.
    ///
    /// Meant to run once no proxies are checked out. Outstanding proxies are
    /// reported, not waited for: their handles become inert. A later
    /// [`allocate`](Self::allocate) starts a fresh storage epoch.
    pub fn shutdown(&self) {
        let storage = self.inner.storage.lock().take();
        let Some(storage) = storage else {
            tracing::debug!(pool = self.inner.label, "proxy pool shutdown: not initialized");
            return;
        };

        let leaked = storage.in_use();
        if leaked > 0 {
            tracing::warn!(
                pool = self.inner.label,
                epoch = storage.epoch(),
                leaked,
                "proxy pool shut down with proxies still checked out"
            );
        }
        tracing::info!(
            pool = self.inner.label,
            epoch = storage.epoch(),
            blocks = storage.block_count(),
            "proxy pool shut down"
        );

        self.inner.active.clear();

        // Dropping leaked objects may drop handles into this pool; the
        // storage is already detached, so those drops see a stale epoch.
        drop(storage);
    }

    /// Whether the storage currently exists.
    pub fn is_initialized(&self) -> bool {
        self.inner.storage.lock().is_some()
    }

    pub fn stats(&self) -> PoolStats {
        self.inner
            .storage
            .lock()
            .as_ref()
            .map_or_else(PoolStats::default, |storage| PoolStats {
                epoch: Some(storage.epoch()),
                blocks: storage.block_count(),
                capacity: storage.capacity(),
                in_use: storage.in_use(),
                free: storage.free_count(),
            })
    }

    /// Number of proxies in the diagnostic active set.
    ///
    /// `None` when tracking is disabled. The value may already be stale if
    /// other threads are creating or dropping handles.
    pub fn active_count(&self) -> Option<usize> {
        self.inner
            .config
            .track_active
            .then(|| self.inner.active.len())
    }

    /// Proxies currently in the diagnostic active set.
    ///
    /// Best-effort under concurrent use: entries inserted or removed while
    /// the set is being walked may or may not appear, and the length need
    /// not match an earlier [`active_count`](Self::active_count).
    pub fn active_proxies(&self) -> Vec<ProxyId> {
        self.inner.active.iter().map(|id| *id).collect()
    }

    // === Count bookkeeping used by the handle types ===

    /// Run `f` on the live proxy named by `id`; `None` if the id is stale.
    fn with_proxy<R>(&self, id: ProxyId, f: impl FnOnce(&mut block::Proxy<T>) -> R) -> Option<R> {
        let mut guard = self.inner.storage.lock();
        guard.as_mut()?.get_mut(id).map(f)
    }

    /// Attach the object to a freshly allocated proxy with strong = 1.
    pub(crate) fn attach(&self, id: ProxyId, object: Arc<T>) {
        let attached = self.with_proxy(id, |proxy| {
            debug_assert!(proxy.strong == 0 && proxy.object.is_none());
            proxy.strong = 1;
            proxy.object = Some(object);
        });
        debug_assert!(attached.is_some(), "{id} vanished between allocate and attach");
    }

    /// Add a strong reference to a live proxy.
    pub(crate) fn retain(&self, id: ProxyId) {
        self.with_proxy(id, |proxy| {
            debug_assert!(proxy.strong > 0, "{id} retained after its object was dropped");
            proxy.strong += 1;
        });
    }

    /// Drop a strong reference.
    ///
    /// At zero the object link is cleared; if no weak reference remains the
    /// proxy goes back to the pool.
    pub(crate) fn release_strong(&self, id: ProxyId) {
        let outcome = self.with_proxy(id, |proxy| {
            debug_assert!(proxy.strong > 0, "{id} strong count underflow");
            proxy.strong -= 1;
            if proxy.strong > 0 {
                return (None, false);
            }
            (proxy.object.take(), proxy.weak == 0)
        });

        if let Some((object, free_proxy)) = outcome {
            drop(object);
            if free_proxy {
                self.release(id);
            }
        }
    }

    /// Add a weak reference to a live proxy.
    pub(crate) fn retain_weak(&self, id: ProxyId) {
        self.with_proxy(id, |proxy| proxy.weak += 1);
    }

    /// Drop a weak reference, releasing the proxy once both counts are zero.
    pub(crate) fn release_weak(&self, id: ProxyId) {
        let free_proxy = self.with_proxy(id, |proxy| {
            debug_assert!(proxy.weak > 0, "{id} weak count underflow");
            proxy.weak -= 1;
            proxy.weak == 0 && proxy.strong == 0
        });

        if free_proxy == Some(true) {
            self.release(id);
        }
    }

    /// Take a new strong reference if the object is still alive.
    pub(crate) fn upgrade(&self, id: ProxyId) -> Option<Arc<T>> {
        self.with_proxy(id, |proxy| {
            let object = proxy.object.clone()?;
            proxy.strong += 1;
            Some(object)
        })
        .flatten()
    }

    /// Current `(strong, weak)` counts; `None` if the id is stale.
    pub(crate) fn counts(&self, id: ProxyId) -> Option<(u32, u32)> {
        self.with_proxy(id, |proxy| (proxy.strong, proxy.weak))
    }
}

impl<T> Clone for ProxyPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ProxyPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyPool")
            .field("label", &self.inner.label)
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}
