//! Strong and weak handles backed by pooled proxies.
//!
//! A [`Ref`] caches the object pointer so dereferencing never touches the
//! pool; the proxy's strong count decides when the object is detached.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::{ProxyId, ProxyPool};

/// Strong, reference-counted handle to a pooled object.
pub struct Ref<T> {
    pool: ProxyPool<T>,
    id: ProxyId,
    object: Arc<T>,
}

/// Weak handle: keeps the proxy alive but not the object.
pub struct WeakRef<T> {
    pool: ProxyPool<T>,
    id: ProxyId,
}

impl<T> ProxyPool<T> {
    /// Move `value` under reference counting, returning the first strong
    /// handle to it.
    pub fn adopt(&self, value: T) -> Ref<T> {
        let id = self.allocate();
        let object = Arc::new(value);
        self.attach(id, Arc::clone(&object));
        Ref {
            pool: self.clone(),
            id,
            object,
        }
    }
}

impl<T> Ref<T> {
    /// The proxy backing this handle group.
    #[inline]
    pub fn id(this: &Self) -> ProxyId {
        this.id
    }

    /// The pool the proxy was drawn from.
    #[inline]
    pub fn pool(this: &Self) -> &ProxyPool<T> {
        &this.pool
    }

    /// Check whether two handles share one proxy.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.id == other.id && this.pool.same_pool(&other.pool)
    }

    /// Number of strong handles; 0 once the pool has been shut down.
    pub fn strong_count(this: &Self) -> u32 {
        this.pool.counts(this.id).map_or(0, |(strong, _)| strong)
    }

    /// Number of weak handles; 0 once the pool has been shut down.
    pub fn weak_count(this: &Self) -> u32 {
        this.pool.counts(this.id).map_or(0, |(_, weak)| weak)
    }

    /// Create a weak handle to the same object.
    pub fn downgrade(this: &Self) -> WeakRef<T> {
        this.pool.retain_weak(this.id);
        WeakRef {
            pool: this.pool.clone(),
            id: this.id,
        }
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        self.pool.retain(self.id);
        Self {
            pool: self.pool.clone(),
            id: self.id,
            object: Arc::clone(&self.object),
        }
    }
}

impl<T> Drop for Ref<T> {
    fn drop(&mut self) {
        self.pool.release_strong(self.id);
    }
}

impl<T> Deref for Ref<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        Ref::ptr_eq(self, other)
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.id)
            .field("object", &*self.object)
            .finish()
    }
}

impl<T> WeakRef<T> {
    #[inline]
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Get a strong handle if the object has not been dropped yet.
    pub fn upgrade(&self) -> Option<Ref<T>> {
        let object = self.pool.upgrade(self.id)?;
        Some(Ref {
            pool: self.pool.clone(),
            id: self.id,
            object,
        })
    }

    /// Whether the object is still alive.
    pub fn is_alive(&self) -> bool {
        self.pool.counts(self.id).is_some_and(|(strong, _)| strong > 0)
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        self.pool.retain_weak(self.id);
        Self {
            pool: self.pool.clone(),
            id: self.id,
        }
    }
}

impl<T> Drop for WeakRef<T> {
    fn drop(&mut self) {
        self.pool.release_weak(self.id);
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakRef").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests;
