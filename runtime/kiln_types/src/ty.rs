//! Type descriptors.

use std::fmt;

use kiln_ir::Name;
use kiln_object::ObjectRef;
use kiln_rc::Ref;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::TypeFlags;

/// Strong handle to a type descriptor.
pub type TypeRef = Ref<Type>;

/// Deepest parent chain a subtype query will follow.
///
/// The registry only accepts registered parents, so chains are acyclic; a
/// walk that runs past this depth means the hierarchy is corrupt.
pub const MAX_TYPE_DEPTH: usize = 256;

/// Runtime description of one class of object.
///
/// Name and flags are fixed at creation. The parent and template links are
/// dropped when the type is unregistered, so a descriptor that outlives its
/// registration reports neither.
pub struct Type {
    name: Name,
    flags: TypeFlags,
    links: RwLock<TypeLinks>,
}

struct TypeLinks {
    parent: Option<TypeRef>,
    template: Option<ObjectRef>,
}

impl Type {
    pub(crate) fn new(
        name: Name,
        flags: TypeFlags,
        parent: Option<TypeRef>,
        template: ObjectRef,
    ) -> Self {
        Self {
            name,
            flags,
            links: RwLock::new(TypeLinks {
                parent,
                template: Some(template),
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<TypeRef> {
        self.links.read().parent.clone()
    }

    /// The default template object, registered under the type package.
    pub fn template(&self) -> Option<ObjectRef> {
        self.links.read().template.clone()
    }

    /// Whether `other` is this type or one of its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if the parent chain is deeper than [`MAX_TYPE_DEPTH`].
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        let mut current = self.parent();
        let mut depth = 0;
        while let Some(ty) = current {
            if std::ptr::eq(&*ty, other) {
                return true;
            }
            depth += 1;
            assert!(
                depth <= MAX_TYPE_DEPTH,
                "type hierarchy deeper than {MAX_TYPE_DEPTH} levels; parent chain is cyclic"
            );
            current = ty.parent();
        }
        false
    }

    /// Parent chain, nearest first. Does not include `self`.
    pub fn ancestors(&self) -> SmallVec<[TypeRef; 8]> {
        let mut chain: SmallVec<[TypeRef; 8]> = SmallVec::new();
        let mut current = self.parent();
        while let Some(ty) = current {
            assert!(
                chain.len() < MAX_TYPE_DEPTH,
                "type hierarchy deeper than {MAX_TYPE_DEPTH} levels; parent chain is cyclic"
            );
            current = ty.parent();
            chain.push(ty);
        }
        chain
    }

    /// Depth in the hierarchy; root types are at depth zero.
    pub fn depth(&self) -> usize {
        self.ancestors().len()
    }

    /// Drop the parent and template links, handing them to the caller so
    /// they can be released outside any registry lock.
    pub(crate) fn take_links(&self) -> (Option<TypeRef>, Option<ObjectRef>) {
        let mut links = self.links.write();
        (links.parent.take(), links.template.take())
    }

    pub(crate) fn is_child_of(&self, parent: &TypeRef) -> bool {
        self.links
            .read()
            .parent
            .as_ref()
            .is_some_and(|p| Ref::ptr_eq(p, parent))
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = self.links.read();
        f.debug_struct("Type")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("parent", &links.parent.as_ref().map(|p| p.name()))
            .field("template", &links.template.as_ref().map(Ref::id))
            .finish()
    }
}
