//! Shared object instances.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use kiln_ir::Name;
use kiln_rc::Ref;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::ObjectFlags;

/// Strong handle to an object.
pub type ObjectRef = Ref<Object>;

/// An object instance: a name, an optional owning package, and flags.
///
/// Objects are only ever reached through [`ObjectRef`]; all mutation goes
/// through the [`ObjectSpace`](crate::ObjectSpace) so that package child
/// sets and registrations stay consistent.
pub struct Object {
    state: RwLock<ObjectState>,
    flags: AtomicU32,
}

struct ObjectState {
    name: Name,
    owner: Option<ObjectRef>,
    /// Names of directly owned objects (packages only).
    children: FxHashSet<Name>,
}

impl Object {
    pub(crate) fn new(name: Name, flags: ObjectFlags) -> Self {
        Self {
            state: RwLock::new(ObjectState {
                name,
                owner: None,
                children: FxHashSet::default(),
            }),
            flags: AtomicU32::new(flags.bits()),
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.state.read().name
    }

    /// The package that owns this object, if any.
    pub fn owner(&self) -> Option<ObjectRef> {
        self.state.read().owner.clone()
    }

    #[inline]
    pub fn flags(&self) -> ObjectFlags {
        ObjectFlags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    #[inline]
    pub fn has_flags(&self, flags: ObjectFlags) -> bool {
        self.flags().contains(flags)
    }

    /// Set the given flag bits, leaving the others untouched.
    pub fn set_flags(&self, flags: ObjectFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clear the given flag bits, leaving the others untouched.
    pub fn clear_flags(&self, flags: ObjectFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    #[inline]
    pub fn is_package(&self) -> bool {
        self.has_flags(ObjectFlags::PACKAGE)
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.has_flags(ObjectFlags::REGISTERED)
    }

    /// Whether this package directly owns an object called `name`.
    pub fn contains_child(&self, name: Name) -> bool {
        self.state.read().children.contains(&name)
    }

    pub fn child_count(&self) -> usize {
        self.state.read().children.len()
    }

    /// Whether `self` is `object` or is owned by it, directly or not.
    pub(crate) fn is_within(&self, object: &Object) -> bool {
        if std::ptr::eq(self, object) {
            return true;
        }
        let mut current = self.owner();
        while let Some(owner) = current {
            if std::ptr::eq(&*owner, object) {
                return true;
            }
            current = owner.owner();
        }
        false
    }

    /// Reserve `name` among this package's children; false if taken.
    pub(crate) fn claim_child(&self, name: Name) -> bool {
        name.is_empty() || self.state.write().children.insert(name)
    }

    pub(crate) fn forget_child(&self, name: Name) {
        if !name.is_empty() {
            self.state.write().children.remove(&name);
        }
    }

    /// Replace the owner link, returning the previous owner.
    pub(crate) fn replace_owner(&self, owner: Option<ObjectRef>) -> Option<ObjectRef> {
        std::mem::replace(&mut self.state.write().owner, owner)
    }

    pub(crate) fn replace_name(&self, name: Name) -> Name {
        std::mem::replace(&mut self.state.write().name, name)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Object")
            .field("name", &state.name)
            .field("owner", &state.owner.as_ref().map(Ref::id))
            .field("flags", &self.flags())
            .finish()
    }
}
