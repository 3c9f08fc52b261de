//! Recoverable object system failures.
//!
//! Names and paths are rendered at the failure site so the error can be
//! logged without an interner at hand.

/// Failure of an owner, name, or registration change.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// The requested owner cannot own objects.
    #[error("`{owner}` is not a package and cannot own objects")]
    OwnerNotPackage { owner: String },

    /// The requested owner is the object itself or one of its descendants.
    #[error("making `{owner}` the owner of `{object}` would create an ownership cycle")]
    OwnerCycle { object: String, owner: String },

    /// Registered objects keep their path until unregistered.
    #[error("`{path}` is registered and cannot be moved or renamed")]
    Registered { path: String },

    /// A sibling under the same owner already uses the name.
    #[error("package `{owner}` already contains an object named `{name}`")]
    NameCollision { owner: String, name: String },

    /// Objects must be named before they can be registered.
    #[error("cannot register an unnamed object")]
    Unnamed,

    #[error("`{path}` is already registered")]
    AlreadyRegistered { path: String },

    /// A different object already occupies the path.
    #[error("another object is already registered at `{path}`")]
    PathCollision { path: String },

    #[error("`{path}` is not registered")]
    NotRegistered { path: String },
}
