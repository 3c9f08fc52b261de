//! Runtime startup and teardown.

use std::fmt;

use kiln_ir::{Name, SharedInterner};
use kiln_object::{ObjectRef, ObjectSpace};
use kiln_types::{TypeError, TypeFlags, TypeRef, TypeRegistry};

use crate::RuntimeConfig;

/// Name of the package that owns every template object.
pub const TYPE_PACKAGE_NAME: &str = "Types";

/// A started runtime: object space, type registry, type package, and root
/// type.
pub struct Runtime {
    config: RuntimeConfig,
    objects: ObjectSpace,
    registry: TypeRegistry,
}

/// What [`Runtime::shutdown`] found while tearing down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Types still registered when shutdown began.
    pub released_types: usize,
    /// Objects still registered once the types were gone.
    pub released_objects: usize,
    /// Type proxies still checked out when the type pool was destroyed.
    pub leaked_types: usize,
    /// Object proxies still checked out when the object pool was destroyed.
    pub leaked_objects: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.leaked_types == 0 && self.leaked_objects == 0
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "released {} types and {} objects; leaked {} type proxies and {} object proxies",
            self.released_types, self.released_objects, self.leaked_types, self.leaked_objects
        )
    }
}

impl Runtime {
    /// Bring up the object space and type registry and register the root
    /// type.
    #[tracing::instrument(level = "info", skip_all, fields(block_size = config.pool_block_size))]
    pub fn startup(config: RuntimeConfig) -> Result<Self, TypeError> {
        let pool_config = config.pool_config();
        let objects = ObjectSpace::new(SharedInterner::new(), pool_config);
        let registry = TypeRegistry::new(objects.clone(), pool_config);

        let package = objects.create_package(objects.interner().intern(TYPE_PACKAGE_NAME));
        registry.set_type_package(package);
        registry.create_root_type(&objects.create_object(Name::EMPTY))?;

        tracing::info!("runtime started");
        Ok(Self {
            config,
            objects,
            registry,
        })
    }

    #[inline]
    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        self.objects.interner()
    }

    #[inline]
    pub fn objects(&self) -> &ObjectSpace {
        &self.objects
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The built-in root type.
    pub fn root_type(&self) -> Option<TypeRef> {
        self.registry.root_type()
    }

    pub fn type_package(&self) -> Option<ObjectRef> {
        self.registry.type_package()
    }

    /// Register a type with a fresh template object under the type package.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered.
    pub fn define_type(
        &self,
        name: &str,
        parent: Option<&TypeRef>,
        flags: TypeFlags,
    ) -> Result<TypeRef, TypeError> {
        let Some(package) = self.registry.type_package() else {
            panic!("runtime has already been shut down");
        };
        let template = self.objects.create_object(Name::EMPTY);
        self.registry.create(
            self.interner().intern(name),
            &package,
            parent,
            &template,
            flags,
        )
    }

    /// Tear everything down: the type registry, remaining object
    /// registrations, then the type and object proxy pools.
    ///
    /// Handles that are still alive afterwards are inert.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn shutdown(self) -> ShutdownReport {
        let released_types = self.registry.shutdown();
        let released_objects = self.objects.unregister_all();

        let leaked_types = self.registry.pool().stats().in_use;
        self.registry.pool().shutdown();

        let leaked_objects = self.objects.pool().stats().in_use;
        self.objects.pool().shutdown();

        let report = ShutdownReport {
            released_types,
            released_objects,
            leaked_types,
            leaked_objects,
        };
        if report.is_clean() {
            tracing::info!(%report, "runtime shut down");
        } else {
            tracing::warn!(%report, "runtime shut down with live handles");
        }
        report
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("objects", &self.objects)
            .finish()
    }
}
