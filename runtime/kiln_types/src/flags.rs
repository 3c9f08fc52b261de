//! Type trait flags.
//!
//! Flags are fixed when a type is created. Some of them describe how
//! instances behave and are inherited by every subtype.

use bitflags::bitflags;

bitflags! {
    /// Bit-set of type traits.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u32 {
        // === Structural Flags (bits 0-7) ===

        /// The type cannot be instantiated directly, only subclassed.
        const ABSTRACT = 1 << 0;
        /// The type cannot be used as a parent.
        const FINAL = 1 << 1;

        // === Origin Flags (bits 8-15) ===

        /// Registered by the runtime itself rather than by a module.
        const BUILTIN = 1 << 8;

        // === Instance Flags (bits 16-23) ===
        // Inherited by every subtype.

        /// Instances are never persisted.
        const TRANSIENT = 1 << 16;
        /// Instances only exist in editor builds.
        const EDITOR_ONLY = 1 << 17;
    }
}

impl TypeFlags {
    /// Flags a subtype inherits from its parent.
    pub const INHERITED_MASK: Self =
        Self::from_bits_truncate(Self::TRANSIENT.bits() | Self::EDITOR_ONLY.bits());

    /// Flags that `parent` passes down to a new subtype.
    #[inline]
    pub const fn inherited_from(parent: Self) -> Self {
        parent.intersection(Self::INHERITED_MASK)
    }

    #[inline]
    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    #[inline]
    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.contains(Self::BUILTIN)
    }
}
