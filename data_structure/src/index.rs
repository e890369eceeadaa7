pub mod vec;

/// A marker trait for types that can be indexed by `Idx`.
pub trait Indexable<Idx> {}

/// Declares a `u32`-backed index type implementing [`vec::Idx`].
#[macro_export]
macro_rules! define_index {
    ($(#[$attr:meta])* $vis:vis $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            /// Unwrap the index. Use this only when encoding the index.
            pub fn unwrap_idx(self) -> u32 {
                self.0
            }
        }

        impl $crate::index::vec::Idx for $name {
            fn new(idx: usize) -> Self {
                Self(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}
