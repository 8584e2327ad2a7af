//! Asset resolution: turning asset identifiers into files on disk.
//!
//! - [`SearchPath`] - ordered roots that search-path identifiers are looked up under
//! - [`ReplacePairs`] - exact-match redirections, loaded from layer metadata or a
//!   `replace.json` sidecar
//! - [`ResolverContext`] - a search path plus replace pairs
//! - [`ResolverContextBinder`] - makes a context current for the calling thread
//! - [`Resolver`] - the resolution algorithm and the bootstrap path used when no
//!   context is bound
//!
//! # Example
//!
//! ```no_run
//! use replace_resolver::ar::{Resolver, ResolverConfig, ResolverContext, ResolverContextBinder};
//!
//! let resolver = Resolver::new(ResolverConfig::from_env());
//! let context = ResolverContext::new(["/assets"])
//!     .with_replace_pair("component/c/v1/c.usda", "component/c/v2/c.usda");
//!
//! let _binder = ResolverContextBinder::new(context);
//! let resolved = resolver.resolve("component/c/v1/c.usda");
//! assert_eq!(resolved.as_deref(), Some(std::path::Path::new("/assets/component/c/v2/c.usda")));
//! ```

mod binder;
mod context;
mod error;
mod replace;
mod resolver;
mod search_path;
pub mod tokens;

pub use binder::{current_context, with_context, ResolverContextBinder};
pub use context::ResolverContext;
pub use error::ResolverError;
pub use replace::{LayerMetadata, ReplacePairs};
pub use resolver::{Resolver, ResolverConfig};
pub use search_path::SearchPath;
