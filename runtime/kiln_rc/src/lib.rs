//! Reference-count bookkeeping for kiln objects.
//!
//! Every shared object is reachable only through [`Ref`] (strong) and
//! [`WeakRef`] (weak) handles. The counts behind a group of handles live in
//! a *proxy* record drawn from a [`ProxyPool`]:
//!
//! ```text
//! ProxyPool<T>
//!     └── blocks of proxies (POOL_BLOCK_SIZE per block, grown on demand)
//!           └── proxy { generation, strong, weak, object link }
//!                 ├── Ref<T>      (strong handles, deref to T)
//!                 └── WeakRef<T>  (weak handles, upgrade while strong > 0)
//! ```
//!
//! Proxies are addressed by [`ProxyId`] rather than by address. A slot is
//! reused after release with a bumped generation, and every pool shutdown
//! starts a new epoch drawn from a process-wide counter, so neither a stale
//! id nor an id from another pool can alias a live proxy.
//!
//! # Threading
//!
//! The pool storage is created lazily on the first allocation and is meant
//! to be warmed up during single-threaded startup. After that, allocation,
//! release, and handle clone/drop may run from any thread.

mod handle;
mod id;
mod pool;

pub use handle::{Ref, WeakRef};
pub use id::ProxyId;
pub use pool::{PoolConfig, PoolStats, ProxyPool, POOL_BLOCK_SIZE};
