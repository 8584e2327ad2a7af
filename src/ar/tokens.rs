//! Reserved names shared between the resolver and the files it reads.

/// Key inside a layer's `customLayerData` holding a flat `string[]` of
/// `source, target` pairs.
pub const REPLACE_PAIRS: &str = "replacePairs";

/// Sidecar file looked up next to a layer: a JSON array of `[source, target]` arrays.
pub const REPLACE_FILE_NAME: &str = "replace.json";

/// Search path consulted when no context is bound.
pub const DEFAULT_SEARCH_PATH_ENV: &str = "PXR_AR_DEFAULT_SEARCH_PATH";

/// Layer extensions whose metadata may carry replace pairs.
pub const LAYER_EXTENSIONS: &[&str] = &["usd", "usda", "usdc"];
