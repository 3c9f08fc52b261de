//! Kiln IR - shared identifier types.
//!
//! Type names and object names are interned once and passed around as
//! 32-bit [`Name`] handles:
//! - O(1) equality and hashing
//! - `Copy`, so descriptors can store them without borrowing the interner
//! - one [`SharedInterner`] per runtime, injected into every component

mod interner;
mod name;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-copied handles.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

static_assert_size!(Name, 4);
