pub mod context;
mod mapper;
mod pretty;
mod purity;
mod scope;
mod syntax;
mod visit;

pub use context::*;
pub use mapper::*;
pub use purity::*;
pub use scope::*;
pub use syntax::*;
pub use visit::*;
