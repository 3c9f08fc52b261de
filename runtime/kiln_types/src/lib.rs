//! Runtime type registry.
//!
//! Every class of object is described by a [`Type`]: a unique name, at most
//! one parent type, a template (exemplar) object, and [`TypeFlags`]. Types
//! are themselves reference counted ([`TypeRef`]) and live in a
//! [`TypeRegistry`] keyed by name.
//!
//! # Architecture
//!
//! ```text
//! TypeRegistry
//!     ├── ProxyPool<Type>        (descriptor handles)
//!     ├── lookup map Name → TypeRef (created on first registration)
//!     ├── type package           (owns every template object)
//!     └── ObjectSpace            (registers template objects)
//! ```
//!
//! # Failure channels
//!
//! - Misuse of the registry (duplicate names, unregistering an unknown
//!   type, creating types before the type package is set) panics.
//! - Failures of the object system while adopting a template come back as
//!   [`TypeError`] and leave nothing registered.

mod error;
mod flags;
mod registry;
mod ty;

pub use error::TypeError;
pub use flags::TypeFlags;
pub use registry::{TypeIter, TypeRegistry, ROOT_TYPE_NAME};
pub use ty::{Type, TypeRef, MAX_TYPE_DEPTH};
