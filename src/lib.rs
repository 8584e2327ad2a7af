//! `replace_resolver` resolves USD asset paths through search roots and
//! replace pairs, so a scene built from versioned assets can be repointed to
//! other versions without editing the layers that reference them.
//!
//! # Modules
//!
//! - `ar` - Asset resolution: contexts, replace pairs, context binding, the resolver
//! - `sdf` - Scene Description Foundations: paths, specs and values
//! - `usda` - Text format (.usda) reader
//! - `composition` - Layer composition (sublayers, references, payloads) driven by the resolver

pub mod ar;
pub mod composition;
pub mod sdf;
pub mod usda;

#[cfg(test)]
mod test_util;
