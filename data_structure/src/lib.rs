pub mod arena;
pub mod index;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
