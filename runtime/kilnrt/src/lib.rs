//! Kiln runtime facade.
//!
//! Ties the object space, the type registry, and their proxy pools into one
//! process-lifetime [`Runtime`] value with explicit startup and shutdown.
//!
//! ```text
//! Runtime::startup
//!     ├── SharedInterner
//!     ├── ObjectSpace      (object proxy pool)
//!     ├── TypeRegistry     (type proxy pool)
//!     ├── "Types" package  (type package)
//!     └── root type "Object"
//!
//! Runtime::shutdown
//!     type registry → object registrations → type pool → object pool
//! ```

mod config;
mod runtime;
mod tracing_setup;

pub use config::{ConfigError, RuntimeConfig, POOL_BLOCK_SIZE_VAR, TRACK_PROXIES_VAR};
pub use runtime::{Runtime, ShutdownReport, TYPE_PACKAGE_NAME};
pub use tracing_setup::init_tracing;

pub use kiln_ir::{Name, SharedInterner};
pub use kiln_object::{Object, ObjectError, ObjectFlags, ObjectRef, ObjectSpace};
pub use kiln_rc::{PoolConfig, PoolStats, ProxyId, ProxyPool, Ref, WeakRef};
pub use kiln_types::{Type, TypeError, TypeFlags, TypeRef, TypeRegistry};
