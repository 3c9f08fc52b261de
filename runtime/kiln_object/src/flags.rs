//! Object flag bits.

use bitflags::bitflags;

bitflags! {
    /// Per-object state bits.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ObjectFlags: u32 {
        /// The object is a package and may own other objects.
        const PACKAGE = 1 << 0;
        /// The object is the default template of a registered type.
        const DEFAULT_TEMPLATE = 1 << 1;
        /// The object is published in an object space.
        const REGISTERED = 1 << 2;
        /// The object was created by the runtime itself, not by a loader.
        const BUILTIN = 1 << 3;
    }
}
