//! Path-addressed convenience layer: dotted/bracketed paths, a namespaced
//! [`Root`] handle with a local read cache and deferred writes.

pub mod path;
pub mod root;

pub use path::DotPath;
pub use root::{Root, DEFAULT_CACHE_CAPACITY, DEFAULT_NAMESPACE};
