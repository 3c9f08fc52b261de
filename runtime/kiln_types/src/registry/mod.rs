//! Name-keyed registry of type descriptors.
//!
//! The registry is the single source of truth mapping type names to
//! [`TypeRef`]s. It also owns the type package (the container every
//! template object lives under) and the built-in root type.
//!
//! # Design
//!
//! - `BTreeMap<Name, TypeRef>` for deterministic iteration; created on the
//!   first registration and dropped at shutdown
//! - Descriptors come from the registry's own `ProxyPool<Type>`
//! - One write lock covers a whole `create`/`unregister`, so registration is
//!   all-or-nothing with respect to concurrent readers
//! - Handles taken out of the registry are dropped after the lock is
//!   released

use std::collections::BTreeMap;
use std::fmt;

use kiln_ir::Name;
use kiln_object::{ObjectFlags, ObjectRef, ObjectSpace};
use kiln_rc::{PoolConfig, ProxyPool, Ref};
use parking_lot::RwLock;

use crate::{Type, TypeError, TypeFlags, TypeRef};

/// Name of the built-in root type.
pub const ROOT_TYPE_NAME: &str = "Object";

/// Registry of every live type descriptor.
pub struct TypeRegistry {
    objects: ObjectSpace,
    pool: ProxyPool<Type>,
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    type_package: Option<ObjectRef>,
    /// `None` until the first registration.
    lookup: Option<BTreeMap<Name, TypeRef>>,
    /// Built-in root type; released explicitly at shutdown.
    root: Option<TypeRef>,
}

impl RegistryState {
    fn is_registered(&self, ty: &TypeRef) -> bool {
        self.lookup
            .as_ref()
            .and_then(|lookup| lookup.get(&ty.name()))
            .is_some_and(|entry| Ref::ptr_eq(entry, ty))
    }
}

/// Template state captured before `create` touches it.
struct TemplateSnapshot {
    owner: Option<ObjectRef>,
    name: Name,
    was_default: bool,
}

impl TypeRegistry {
    pub fn new(objects: ObjectSpace, pool_config: PoolConfig) -> Self {
        Self {
            objects,
            pool: ProxyPool::with_config("type", pool_config),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// The object space template objects are registered in.
    #[inline]
    pub fn objects(&self) -> &ObjectSpace {
        &self.objects
    }

    /// The proxy pool every [`TypeRef`] is drawn from.
    #[inline]
    pub fn pool(&self) -> &ProxyPool<Type> {
        &self.pool
    }

    /// Set the package that holds all template objects.
    ///
    /// # Panics
    ///
    /// Panics if a type package is already set or `package` is not a package.
    pub fn set_type_package(&self, package: ObjectRef) {
        assert!(package.is_package(), "type package must be a package object");
        let mut state = self.state.write();
        assert!(state.type_package.is_none(), "type package is already set");
        tracing::debug!(path = %self.objects.path_of(&package), "type package set");
        state.type_package = Some(package);
    }

    pub fn type_package(&self) -> Option<ObjectRef> {
        self.state.read().type_package.clone()
    }

    /// Register a new type.
    ///
    /// `template` is moved under `package`, renamed to `name`, flagged as a
    /// default template, and registered in the object space. If any of those
    /// steps fail the template is put back the way it was and nothing is
    /// registered. A subtype inherits its parent's instance flags.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty, the type package has not been set, or a
    /// type called `name` is already registered.
    pub fn create(
        &self,
        name: Name,
        package: &ObjectRef,
        parent: Option<&TypeRef>,
        template: &ObjectRef,
        flags: TypeFlags,
    ) -> Result<TypeRef, TypeError> {
        assert!(!name.is_empty(), "type name must not be empty");
        let type_name = self.objects.interner().lookup(name);

        let mut state = self.state.write();
        assert!(
            state.type_package.is_some(),
            "type package must be set before type `{type_name}` is created"
        );
        assert!(
            !state
                .lookup
                .as_ref()
                .is_some_and(|lookup| lookup.contains_key(&name)),
            "type `{type_name}` is already registered"
        );

        let mut flags = flags;
        if let Some(parent) = parent {
            let parent_name = self.objects.interner().lookup(parent.name());
            if !state.is_registered(parent) {
                return Err(log_failure(TypeError::ParentNotRegistered {
                    name: type_name.to_owned(),
                    parent: parent_name.to_owned(),
                }));
            }
            if parent.flags().is_final() {
                return Err(log_failure(TypeError::FinalParent {
                    name: type_name.to_owned(),
                    parent: parent_name.to_owned(),
                }));
            }
            flags |= TypeFlags::inherited_from(parent.flags());
        }

        self.adopt_template(name, package, template)
            .map_err(log_failure)?;

        let ty = self
            .pool
            .adopt(Type::new(name, flags, parent.cloned(), template.clone()));
        state
            .lookup
            .get_or_insert_with(BTreeMap::new)
            .insert(name, ty.clone());

        tracing::debug!(
            name = type_name,
            parent = parent.map(|p| self.objects.interner().lookup(p.name())),
            ?flags,
            "type registered"
        );
        Ok(ty)
    }

    /// Register the built-in root type, [`ROOT_TYPE_NAME`], under the type
    /// package and flag its template `BUILTIN`. The registry keeps its own
    /// reference until shutdown.
    ///
    /// # Panics
    ///
    /// Panics if the type package has not been set or the root type is
    /// already registered.
    pub fn create_root_type(&self, template: &ObjectRef) -> Result<TypeRef, TypeError> {
        let package = {
            let state = self.state.read();
            assert!(state.root.is_none(), "root type is already registered");
            state.type_package.clone()
        };
        let Some(package) = package else {
            panic!("type package must be set before the root type is created");
        };

        let name = self.objects.interner().intern(ROOT_TYPE_NAME);
        let root = self.create(
            name,
            &package,
            None,
            template,
            TypeFlags::BUILTIN | TypeFlags::ABSTRACT,
        )?;
        template.set_flags(ObjectFlags::BUILTIN);
        self.state.write().root = Some(root.clone());
        Ok(root)
    }

    pub fn root_type(&self) -> Option<TypeRef> {
        self.state.read().root.clone()
    }

    /// Remove `ty` from the registry and release its parent and template.
    ///
    /// The template object is withdrawn from the object space and detached
    /// from its package, so the name can be registered again.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not registered.
    pub fn unregister(&self, ty: &TypeRef) -> Result<(), TypeError> {
        let type_name = self.objects.interner().lookup(ty.name());

        let released = {
            let mut state = self.state.write();
            assert!(
                state.is_registered(ty),
                "type `{type_name}` is not registered"
            );

            let subtypes = self.subtype_names(&state, ty);
            if !subtypes.is_empty() {
                return Err(log_failure(TypeError::HasSubtypes {
                    name: type_name.to_owned(),
                    subtypes,
                }));
            }

            let root = if state.root.as_ref().is_some_and(|root| Ref::ptr_eq(root, ty)) {
                state.root.take()
            } else {
                None
            };
            let entry = state
                .lookup
                .as_mut()
                .and_then(|lookup| lookup.remove(&ty.name()));

            // Under the lock: once the name is out of the map it is also
            // free in the package.
            let (parent, template) = ty.take_links();
            if let Some(template) = &template {
                self.withdraw_template(type_name, template);
            }
            (entry, root, parent, template)
        };

        tracing::debug!(name = type_name, "type unregistered");
        drop(released);
        Ok(())
    }

    /// Look up a registered type by exact name.
    pub fn find(&self, name: Name) -> Option<TypeRef> {
        self.state.read().lookup.as_ref()?.get(&name).cloned()
    }

    /// Look up a registered type by its string name without interning it.
    pub fn find_by_str(&self, name: &str) -> Option<TypeRef> {
        self.find(self.objects.interner().get(name)?)
    }

    /// Snapshot of every registered type in key order.
    ///
    /// Empty if nothing was ever registered. The iterator is `Clone`, so a
    /// snapshot can be walked more than once.
    pub fn types(&self) -> TypeIter {
        let entries: Vec<(Name, TypeRef)> = self
            .state
            .read()
            .lookup
            .iter()
            .flatten()
            .map(|(name, ty)| (*name, ty.clone()))
            .collect();
        TypeIter {
            inner: entries.into_iter(),
        }
    }

    /// Registered types whose parent is `ty`.
    pub fn subtypes_of(&self, ty: &TypeRef) -> Vec<TypeRef> {
        self.state
            .read()
            .lookup
            .iter()
            .flatten()
            .filter(|(_, candidate)| candidate.is_child_of(ty))
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().lookup.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear down type registration.
    ///
    /// Releases the root type, every remaining type's parent and template
    /// links, the lookup map, and the type package. Returns the number of
    /// types that were still registered. Safe to call more than once; a new
    /// type package may be set afterwards.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn shutdown(&self) -> usize {
        tracing::info!("shutting down type registration");

        let (root, lookup, package) = {
            let mut state = self.state.write();
            (
                state.root.take(),
                state.lookup.take(),
                state.type_package.take(),
            )
        };

        // The root is not owned by any module, so it is released explicitly.
        drop(root);

        let mut released = Vec::new();
        for (name, ty) in lookup.into_iter().flatten() {
            let (parent, template) = ty.take_links();
            if let Some(template) = &template {
                self.withdraw_template(self.objects.interner().lookup(name), template);
            }
            released.push((ty, parent, template));
        }
        let count = released.len();
        drop(released);
        drop(package);

        tracing::info!(released = count, "type registration shutdown complete");
        count
    }

    fn subtype_names(&self, state: &RegistryState, ty: &TypeRef) -> Vec<String> {
        state
            .lookup
            .iter()
            .flatten()
            .filter(|(_, candidate)| candidate.is_child_of(ty))
            .map(|(name, _)| self.objects.interner().lookup(*name).to_owned())
            .collect()
    }

    /// Move `template` into `package` as `name` and register it.
    fn adopt_template(
        &self,
        name: Name,
        package: &ObjectRef,
        template: &ObjectRef,
    ) -> Result<(), TypeError> {
        let type_name = self.objects.interner().lookup(name);
        let snapshot = TemplateSnapshot {
            owner: template.owner(),
            name: template.name(),
            was_default: template.has_flags(ObjectFlags::DEFAULT_TEMPLATE),
        };

        self.objects
            .set_owner(template, Some(package))
            .map_err(|source| TypeError::TemplateOwner {
                name: type_name.to_owned(),
                source,
            })?;

        if let Err(source) = self.objects.set_name(template, name) {
            self.restore_template(template, &snapshot);
            return Err(TypeError::TemplateName {
                name: type_name.to_owned(),
                source,
            });
        }

        template.set_flags(ObjectFlags::DEFAULT_TEMPLATE);
        if let Err(source) = self.objects.register_object(template) {
            self.restore_template(template, &snapshot);
            return Err(TypeError::TemplateRegistration {
                name: type_name.to_owned(),
                source,
            });
        }
        Ok(())
    }

    fn restore_template(&self, template: &ObjectRef, snapshot: &TemplateSnapshot) {
        if !snapshot.was_default {
            template.clear_flags(ObjectFlags::DEFAULT_TEMPLATE);
        }
        // Name first: the previous name is only known to be free in the
        // package the template is leaving.
        if let Err(error) = self.objects.set_name(template, snapshot.name) {
            tracing::warn!(%error, "failed to restore template object name");
        }
        if let Err(error) = self.objects.set_owner(template, snapshot.owner.as_ref()) {
            tracing::warn!(%error, "failed to restore template object owner");
        }
    }

    fn withdraw_template(&self, type_name: &str, template: &ObjectRef) {
        if template.is_registered() {
            if let Err(error) = self.objects.unregister_object(template) {
                tracing::warn!(name = type_name, %error, "failed to unregister type template object");
            }
        }
        template.clear_flags(ObjectFlags::DEFAULT_TEMPLATE);
        if let Err(error) = self.objects.set_owner(template, None) {
            tracing::warn!(name = type_name, %error, "failed to detach type template object");
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

fn log_failure(error: TypeError) -> TypeError {
    tracing::error!(%error, "type registration failed");
    error
}

/// Iterator over a snapshot of registered types.
#[derive(Clone)]
pub struct TypeIter {
    inner: std::vec::IntoIter<(Name, TypeRef)>,
}

impl Iterator for TypeIter {
    type Item = (Name, TypeRef);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for TypeIter {}

impl fmt::Debug for TypeIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIter")
            .field("remaining", &self.inner.len())
            .finish()
    }
}
