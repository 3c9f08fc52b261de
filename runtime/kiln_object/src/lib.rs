//! The object system underneath kiln types.
//!
//! Objects are shared through [`ObjectRef`] handles drawn from the
//! [`ObjectSpace`]'s proxy pool. Packages are objects that own other
//! objects by name; registering an object publishes it under its path
//! (`/Package/Name`) so it can be found again.
//!
//! The type registry uses this crate for its template objects: each type's
//! exemplar instance is moved under the type package, renamed to the type
//! name, flagged as a default template, and registered here.

mod error;
mod flags;
mod object;
mod space;

pub use error::ObjectError;
pub use flags::ObjectFlags;
pub use object::{Object, ObjectRef};
pub use space::ObjectSpace;
