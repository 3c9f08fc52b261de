//! Object space: creation, ownership, naming, and registration.

use std::fmt;
use std::sync::Arc;

use kiln_ir::{Name, SharedInterner};
use kiln_rc::{PoolConfig, ProxyPool, Ref};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Object, ObjectError, ObjectFlags, ObjectRef};

/// The object system context.
///
/// Cheap to clone; clones share the proxy pool and the registration table.
#[derive(Clone)]
pub struct ObjectSpace {
    inner: Arc<SpaceInner>,
}

struct SpaceInner {
    interner: SharedInterner,
    pool: ProxyPool<Object>,
    /// Registered objects by path. Holds a strong reference to each.
    registered: RwLock<FxHashMap<String, ObjectRef>>,
}

impl ObjectSpace {
    pub fn new(interner: SharedInterner, pool_config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(SpaceInner {
                interner,
                pool: ProxyPool::with_config("object", pool_config),
                registered: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.inner.interner
    }

    /// The proxy pool every [`ObjectRef`] of this space is drawn from.
    #[inline]
    pub fn pool(&self) -> &ProxyPool<Object> {
        &self.inner.pool
    }

    /// Create an unowned package.
    pub fn create_package(&self, name: Name) -> ObjectRef {
        self.inner
            .pool
            .adopt(Object::new(name, ObjectFlags::PACKAGE))
    }

    /// Create an unowned, unregistered object. `name` may be empty.
    pub fn create_object(&self, name: Name) -> ObjectRef {
        self.inner
            .pool
            .adopt(Object::new(name, ObjectFlags::empty()))
    }

    /// Slash-separated path from the outermost owner, e.g. `/Types/Mesh`.
    pub fn path_of(&self, object: &Object) -> String {
        let mut names: SmallVec<[Name; 8]> = SmallVec::new();
        names.push(object.name());
        let mut current = object.owner();
        while let Some(owner) = current {
            names.push(owner.name());
            current = owner.owner();
        }

        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(self.inner.interner.lookup(*name));
        }
        path
    }

    /// Move `object` under `owner` (or detach it with `None`).
    ///
    /// The object keeps its name; the new owner must be a package that has
    /// no other child by that name.
    pub fn set_owner(&self, object: &ObjectRef, owner: Option<&ObjectRef>) -> Result<(), ObjectError> {
        if object.is_registered() {
            return Err(ObjectError::Registered {
                path: self.path_of(object),
            });
        }

        let current = object.owner();
        if current.as_ref() == owner {
            return Ok(());
        }

        let name = object.name();
        if let Some(owner) = owner {
            if !owner.is_package() {
                return Err(ObjectError::OwnerNotPackage {
                    owner: self.path_of(owner),
                });
            }
            if owner.is_within(object) {
                return Err(ObjectError::OwnerCycle {
                    object: self.path_of(object),
                    owner: self.path_of(owner),
                });
            }
            if !owner.claim_child(name) {
                return Err(ObjectError::NameCollision {
                    owner: self.path_of(owner),
                    name: self.inner.interner.lookup(name).to_owned(),
                });
            }
        }

        if let Some(previous) = &current {
            previous.forget_child(name);
        }
        object.replace_owner(owner.cloned());

        tracing::trace!(path = %self.path_of(object), "object owner changed");
        Ok(())
    }

    /// Rename `object`, keeping its owner.
    pub fn set_name(&self, object: &ObjectRef, name: Name) -> Result<(), ObjectError> {
        if object.is_registered() {
            return Err(ObjectError::Registered {
                path: self.path_of(object),
            });
        }

        let previous = object.name();
        if previous == name {
            return Ok(());
        }

        if let Some(owner) = object.owner() {
            if !owner.claim_child(name) {
                return Err(ObjectError::NameCollision {
                    owner: self.path_of(&owner),
                    name: self.inner.interner.lookup(name).to_owned(),
                });
            }
            owner.forget_child(previous);
        }
        object.replace_name(name);
        Ok(())
    }

    /// Publish `object` under its current path.
    ///
    /// The space keeps a strong reference until the object is unregistered.
    pub fn register_object(&self, object: &ObjectRef) -> Result<(), ObjectError> {
        if object.name().is_empty() {
            return Err(ObjectError::Unnamed);
        }

        let path = self.path_of(object);
        if object.is_registered() {
            return Err(ObjectError::AlreadyRegistered { path });
        }

        let mut registered = self.inner.registered.write();
        if registered.contains_key(&path) {
            return Err(ObjectError::PathCollision { path });
        }
        object.set_flags(ObjectFlags::REGISTERED);
        tracing::debug!(%path, "object registered");
        registered.insert(path, object.clone());
        Ok(())
    }

    /// Withdraw `object` from the space and drop the space's reference.
    pub fn unregister_object(&self, object: &ObjectRef) -> Result<(), ObjectError> {
        let path = self.path_of(object);
        let removed = {
            let mut registered = self.inner.registered.write();
            match registered.get(&path) {
                Some(entry) if Ref::ptr_eq(entry, object) => registered.remove(&path),
                _ => None,
            }
        };

        let Some(removed) = removed else {
            return Err(ObjectError::NotRegistered { path });
        };
        object.clear_flags(ObjectFlags::REGISTERED);
        tracing::debug!(%path, "object unregistered");
        drop(removed);
        Ok(())
    }

    /// Look up a registered object by path.
    pub fn find_object(&self, path: &str) -> Option<ObjectRef> {
        self.inner.registered.read().get(path).cloned()
    }

    pub fn registered_count(&self) -> usize {
        self.inner.registered.read().len()
    }

    /// Drop every registration, returning how many were dropped.
    pub fn unregister_all(&self) -> usize {
        let drained: Vec<ObjectRef> = self
            .inner
            .registered
            .write()
            .drain()
            .map(|(_, object)| object)
            .collect();
        for object in &drained {
            object.clear_flags(ObjectFlags::REGISTERED);
        }
        tracing::debug!(count = drained.len(), "object space cleared");
        drained.len()
    }
}

impl fmt::Debug for ObjectSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpace")
            .field("registered", &self.registered_count())
            .field("pool", &self.inner.pool)
            .finish()
    }
}
