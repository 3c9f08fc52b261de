//! Recoverable type registration failures.

use kiln_object::ObjectError;

/// Failure returned by [`TypeRegistry`](crate::TypeRegistry) operations.
///
/// Every variant leaves the registry unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The template object could not be moved into the type package.
    #[error("failed to set type `{name}` template object owner")]
    TemplateOwner {
        name: String,
        #[source]
        source: ObjectError,
    },

    /// The template object could not be renamed after the type.
    #[error("failed to set type `{name}` template object name")]
    TemplateName {
        name: String,
        #[source]
        source: ObjectError,
    },

    /// The object system refused to register the template object.
    #[error("failed to register type `{name}` template object")]
    TemplateRegistration {
        name: String,
        #[source]
        source: ObjectError,
    },

    /// The requested parent is not (or no longer) registered.
    #[error("parent `{parent}` of type `{name}` is not registered")]
    ParentNotRegistered { name: String, parent: String },

    /// The requested parent is flagged `FINAL`.
    #[error("type `{name}` cannot derive from final type `{parent}`")]
    FinalParent { name: String, parent: String },

    /// Registered types still name this type as their parent.
    #[error("cannot unregister type `{name}` while subtypes {subtypes:?} are registered")]
    HasSubtypes { name: String, subtypes: Vec<String> },
}
