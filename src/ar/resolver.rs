//! Asset resolution with search paths and replace pairs.
//!
//! Identifiers come in three shapes:
//! - absolute paths, resolved when the file exists;
//! - file-relative paths (`./x.usda`, `../v1/x.usda`), which are anchored to
//!   the referring layer with [`Resolver::anchor_relative_path`] before they
//!   reach [`Resolver::resolve`];
//! - search paths (`assembly/b/v1/b.usda`), looked up under each root of the
//!   active context's [`SearchPath`](super::SearchPath).
//!
//! Before the search, the identifier is looked up in the active context's
//! replace pairs and swapped for its target on an exact match.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::binder::current_context;
use super::context::ResolverContext;
use super::error::ResolverError;
use super::replace::{LayerMetadata, ReplacePairs};
use super::tokens;

/// Settings captured when a [`Resolver`] is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Directories searched when no context is bound, ahead of the
    /// environment-provided ones.
    pub default_search_path: Vec<PathBuf>,
    /// Raw `PXR_AR_DEFAULT_SEARCH_PATH` value, a platform path list.
    pub env_search_path: Option<OsString>,
}

impl ResolverConfig {
    /// Read `PXR_AR_DEFAULT_SEARCH_PATH` from the process environment.
    pub fn from_env() -> Self {
        Self {
            default_search_path: Vec::new(),
            env_search_path: std::env::var_os(tokens::DEFAULT_SEARCH_PATH_ENV).filter(|v| !v.is_empty()),
        }
    }

    pub fn with_default_search_path<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.default_search_path = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env_search_path(mut self, value: impl Into<OsString>) -> Self {
        self.env_search_path = Some(value.into());
        self
    }

    /// Explicit default roots followed by the environment roots.
    pub fn search_path(&self) -> Vec<PathBuf> {
        let mut roots = self.default_search_path.clone();
        if let Some(env) = &self.env_search_path {
            roots.extend(std::env::split_paths(env));
        }
        roots
    }
}

/// Resolves asset identifiers against the context bound on the calling
/// thread, a configured default context, or the fallback search path.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    fallback_context: ResolverContext,
    default_context: Option<Arc<ResolverContext>>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        let fallback_context = ResolverContext::new(config.search_path());
        Self {
            config,
            fallback_context,
            default_context: None,
        }
    }

    /// Resolver configured from the process environment.
    pub fn from_env() -> Self {
        Self::new(ResolverConfig::from_env())
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Context used when nothing is bound and no default is configured.
    pub fn fallback_context(&self) -> &ResolverContext {
        &self.fallback_context
    }

    /// Returns true for non-empty paths that are not absolute.
    pub fn is_relative_path(&self, path: &str) -> bool {
        !path.is_empty() && Path::new(path).is_relative()
    }

    /// Returns true for `./` and `../` paths, which are relative to the
    /// referring layer rather than to a search root.
    pub fn is_file_relative(&self, path: &str) -> bool {
        path.starts_with("./") || path.starts_with("../")
    }

    /// Returns true for relative paths resolved through the search path.
    pub fn is_search_path(&self, path: &str) -> bool {
        self.is_relative_path(path) && !self.is_file_relative(path)
    }

    /// Anchor a relative `path` to the layer at `anchor_path`.
    ///
    /// Unless `anchor_path` ends with `/`, its last component names a file and
    /// is dropped. Absolute paths, and any path paired with a relative anchor,
    /// are returned unchanged.
    pub fn anchor_relative_path(&self, anchor_path: &str, path: &str) -> String {
        if self.is_relative_path(anchor_path) || !self.is_relative_path(path) {
            return path.to_owned();
        }

        let forward = anchor_path.replace('\\', "/");
        let dir = match forward.rfind('/') {
            Some(i) => &forward[..i],
            None => "",
        };

        self.compute_normalized_path(&format!("{dir}/{path}"))
    }

    /// Lexically normalize a path: collapse separators, `.` and `..`.
    pub fn compute_normalized_path(&self, path: &str) -> String {
        let forward = path.replace('\\', "/");
        let absolute = forward.starts_with('/');

        let mut parts: Vec<&str> = Vec::new();
        for component in forward.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    if parts.last().is_some_and(|last| *last != "..") {
                        parts.pop();
                    } else if !absolute {
                        parts.push("..");
                    }
                }
                other => parts.push(other),
            }
        }

        let joined = parts.join("/");
        if absolute {
            format!("/{joined}")
        } else if joined.is_empty() {
            ".".to_owned()
        } else {
            joined
        }
    }

    /// File extension without the dot, or an empty string.
    pub fn get_extension(&self, path: &str) -> String {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_owned()
    }

    /// Resolve `identifier` with the currently bound context.
    ///
    /// When nothing is bound on this thread the resolver falls back to its
    /// configured default context, then to its fallback search path.
    ///
    /// This entry point never reads layer metadata or `replace.json` itself.
    /// Pair discovery for a root asset happens in
    /// [`create_default_context_for_asset`](Self::create_default_context_for_asset),
    /// which [`ComposedLayer::open`](crate::composition::ComposedLayer::open) binds
    /// for the whole composition, or which
    /// [`configure_resolver_for_asset`](Self::configure_resolver_for_asset) installs
    /// as the default context.
    pub fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        log::debug!(target: "replace_resolver::path", "Unresolved path \"{identifier}\"");

        let resolved = match current_context() {
            Some(ctx) => {
                log::debug!(target: "replace_resolver::context", "Current resolver context:\n{ctx}");
                self.resolve_with_context(identifier, &ctx)
            }
            None => match &self.default_context {
                Some(ctx) => self.resolve_with_context(identifier, ctx),
                None => self.resolve_with_context(identifier, &self.fallback_context),
            },
        };

        log::debug!(
            target: "replace_resolver::path",
            "Resolved path \"{}\"",
            resolved.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
        );
        resolved
    }

    /// Resolve `identifier` against an explicit context.
    ///
    /// The replace table is consulted first; the search then runs for the
    /// target when a pair matched, and for the identifier itself otherwise.
    pub fn resolve_with_context(&self, identifier: &str, context: &ResolverContext) -> Option<PathBuf> {
        if identifier.is_empty() {
            return None;
        }

        let target = match context.replace_pairs().lookup(identifier) {
            Some(target) => {
                log::debug!(target: "replace_resolver::replace", "Replacing \"{identifier}\" with \"{target}\"");
                target
            }
            None => identifier,
        };

        if !self.is_relative_path(target) {
            let path = Path::new(target);
            return path.is_file().then(|| path.to_path_buf());
        }

        if self.is_search_path(target) {
            return context.search_path().resolve(target);
        }

        log::debug!(
            target: "replace_resolver::path",
            "File-relative path \"{target}\" was not anchored to a layer"
        );
        None
    }

    /// The configured default context, or an empty one.
    pub fn create_default_context(&self) -> ResolverContext {
        self.default_context.as_deref().cloned().unwrap_or_default()
    }

    /// Build the context used to open `asset_path` when the caller supplies none.
    ///
    /// The search path comes from the resolver configuration. Replace pairs
    /// come from the layer's metadata (when `metadata` is given and the asset
    /// is a layer) followed by the sidecar file next to the asset. Since the
    /// first matching pair wins, metadata pairs take precedence over sidecar
    /// pairs with the same source.
    pub fn create_default_context_for_asset(
        &self,
        asset_path: &Path,
        metadata: Option<&dyn LayerMetadata>,
    ) -> Result<ResolverContext, ResolverError> {
        if asset_path.as_os_str().is_empty() {
            return Ok(ResolverContext::default());
        }

        let mut context = ResolverContext::new(self.config.search_path());

        let extension = asset_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if let Some(metadata) = metadata {
            if tokens::LAYER_EXTENSIONS.contains(&extension.as_str()) {
                context.extend_replace_pairs(&ReplacePairs::from_metadata(metadata));
            }
        }

        let abs_path = std::path::absolute(asset_path).unwrap_or_else(|_| asset_path.to_path_buf());
        context.extend_replace_pairs(&ReplacePairs::read_sidecar_for_layer(&abs_path)?);

        Ok(context)
    }

    /// Make the context for `asset_path` the default used when nothing is bound.
    pub fn configure_resolver_for_asset(
        &mut self,
        asset_path: &Path,
        metadata: Option<&dyn LayerMetadata>,
    ) -> Result<(), ResolverError> {
        let context = self.create_default_context_for_asset(asset_path, metadata)?;
        self.default_context = Some(Arc::new(context));
        Ok(())
    }

    /// Modification time of a resolved asset.
    pub fn get_modification_timestamp(&self, resolved_path: &Path) -> Option<SystemTime> {
        std::fs::metadata(resolved_path).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::ResolverContextBinder;
    use crate::test_util::{cleanup_temp_dir, create_temp_dir, touch, write_file};

    struct Pairs(Vec<String>);

    impl LayerMetadata for Pairs {
        fn metadata_array(&self, key: &str) -> Option<Vec<String>> {
            (key == tokens::REPLACE_PAIRS).then(|| self.0.clone())
        }
    }

    fn pairs(values: &[&str]) -> Pairs {
        Pairs(values.iter().map(|s| s.to_string()).collect())
    }

    fn bare_resolver() -> Resolver {
        Resolver::new(ResolverConfig::default())
    }

    #[test]
    fn replace_before_search() {
        let root = create_temp_dir();
        touch(&root.join("component/c/v1/c.usda"));
        touch(&root.join("component/c/v2/c.usda"));

        let resolver = bare_resolver();
        let ctx = ResolverContext::new([&root]).with_replace_pair("component/c/v1/c.usda", "component/c/v2/c.usda");

        assert_eq!(
            resolver.resolve_with_context("component/c/v1/c.usda", &ctx),
            Some(root.join("component/c/v2/c.usda"))
        );
        assert_eq!(
            resolver.resolve_with_context("component/c/v2/c.usda", &ctx),
            Some(root.join("component/c/v2/c.usda"))
        );

        cleanup_temp_dir(&root);
    }

    #[test]
    fn missing_target_does_not_fall_back_to_source() {
        let root = create_temp_dir();
        touch(&root.join("a_v1.usda"));

        let resolver = bare_resolver();
        let ctx = ResolverContext::new([&root]).with_replace_pair("a_v1.usda", "a_v9.usda");

        assert_eq!(resolver.resolve_with_context("a_v1.usda", &ctx), None);

        cleanup_temp_dir(&root);
    }

    #[test]
    fn unrelated_pairs_do_not_change_results() {
        let root = create_temp_dir();
        touch(&root.join("a.usda"));

        let resolver = bare_resolver();
        let plain = ResolverContext::new([&root]);
        let other = ResolverContext::new([&root]).with_replace_pair("b.usda", "c.usda");

        let first = resolver.resolve_with_context("a.usda", &plain);
        assert_eq!(first, Some(root.join("a.usda")));
        assert_eq!(resolver.resolve_with_context("a.usda", &other), first);
        assert_eq!(resolver.resolve_with_context("a.usda", &plain), first);

        cleanup_temp_dir(&root);
    }

    #[test]
    fn absolute_and_empty_identifiers() {
        let root = create_temp_dir();
        let file = root.join("abs.usda");
        touch(&file);

        let resolver = bare_resolver();
        let ctx = ResolverContext::default();

        assert_eq!(resolver.resolve_with_context(file.to_str().unwrap(), &ctx), Some(file.clone()));
        assert_eq!(
            resolver.resolve_with_context(root.join("nope.usda").to_str().unwrap(), &ctx),
            None
        );
        assert_eq!(resolver.resolve_with_context("", &ctx), None);
        assert_eq!(resolver.resolve_with_context("./abs.usda", &ctx), None);

        cleanup_temp_dir(&root);
    }

    #[test]
    fn bound_context_beats_fallback() {
        let fallback_root = create_temp_dir();
        let bound_root = create_temp_dir();
        touch(&fallback_root.join("x.usda"));
        touch(&bound_root.join("x.usda"));

        let resolver = Resolver::new(ResolverConfig::default().with_default_search_path([&fallback_root]));
        assert_eq!(resolver.resolve("x.usda"), Some(fallback_root.join("x.usda")));

        {
            let _binder = ResolverContextBinder::new(ResolverContext::new([&bound_root]));
            assert_eq!(resolver.resolve("x.usda"), Some(bound_root.join("x.usda")));

            {
                let _none = ResolverContextBinder::empty();
                assert_eq!(resolver.resolve("x.usda"), Some(fallback_root.join("x.usda")));
            }
        }

        assert_eq!(resolver.resolve("x.usda"), Some(fallback_root.join("x.usda")));

        cleanup_temp_dir(&fallback_root);
        cleanup_temp_dir(&bound_root);
    }

    #[test]
    fn env_search_path_is_a_path_list() {
        let a = create_temp_dir();
        let b = create_temp_dir();
        touch(&b.join("only_in_b.usda"));

        let joined = std::env::join_paths([&a, &b]).unwrap();
        let config = ResolverConfig::default()
            .with_default_search_path(["/explicit"])
            .with_env_search_path(joined);

        assert_eq!(config.search_path(), vec![PathBuf::from("/explicit"), a.clone(), b.clone()]);

        let resolver = Resolver::new(config);
        assert_eq!(resolver.resolve("only_in_b.usda"), Some(b.join("only_in_b.usda")));

        cleanup_temp_dir(&a);
        cleanup_temp_dir(&b);
    }

    #[test]
    fn default_context_from_metadata_and_sidecar() {
        let root = create_temp_dir();
        let layer = root.join("assembly/a/v2/a.usda");
        touch(&layer);
        write_file(
            &root.join("assembly/a/v2").join(tokens::REPLACE_FILE_NAME),
            r#"[["shared.usda", "from_sidecar.usda"], ["sidecar_only.usda", "s2.usda"]]"#,
        );

        let resolver = Resolver::new(ResolverConfig::default().with_env_search_path(root.as_os_str()));
        let metadata = pairs(&["shared.usda", "from_metadata.usda", "meta_only.usda", "m2.usda"]);
        let ctx = resolver.create_default_context_for_asset(&layer, Some(&metadata)).unwrap();

        assert_eq!(ctx.search_path().roots(), &[root.clone()]);
        let table = ctx.replace_pairs();
        assert_eq!(table.lookup("shared.usda"), Some("from_metadata.usda"));
        assert_eq!(table.lookup("meta_only.usda"), Some("m2.usda"));
        assert_eq!(table.lookup("sidecar_only.usda"), Some("s2.usda"));

        cleanup_temp_dir(&root);
    }

    #[test]
    fn metadata_ignored_for_non_layer_assets() {
        let root = create_temp_dir();
        let texture = root.join("tex.png");
        touch(&texture);

        let resolver = bare_resolver();
        let ctx = resolver
            .create_default_context_for_asset(&texture, Some(&pairs(&["a", "b"])))
            .unwrap();
        assert!(ctx.replace_pairs().is_empty());

        assert!(resolver
            .create_default_context_for_asset(Path::new(""), None)
            .unwrap()
            .is_empty());

        cleanup_temp_dir(&root);
    }

    #[test]
    fn malformed_sidecar_fails_bootstrap() {
        let root = create_temp_dir();
        let layer = root.join("a.usda");
        touch(&layer);
        write_file(&root.join(tokens::REPLACE_FILE_NAME), r#"[["only-one"]]"#);

        let mut resolver = bare_resolver();
        let err = resolver.configure_resolver_for_asset(&layer, None).unwrap_err();
        assert!(matches!(err, ResolverError::MalformedReplaceFile { .. }));
        assert!(resolver.create_default_context().is_empty());

        cleanup_temp_dir(&root);
    }

    #[test]
    fn unreadable_sidecar_fails_bootstrap() {
        let root = create_temp_dir();
        let layer = root.join("a.usda");
        touch(&layer);
        // Present but not a readable file.
        let sidecar = root.join(tokens::REPLACE_FILE_NAME);
        std::fs::create_dir_all(&sidecar).unwrap();

        let err = ReplacePairs::read_sidecar(&sidecar).unwrap_err();
        assert!(matches!(&err, ResolverError::ReadReplaceFile { path, .. } if *path == sidecar));

        let mut resolver = bare_resolver();
        let err = resolver.configure_resolver_for_asset(&layer, None).unwrap_err();
        assert!(matches!(err, ResolverError::ReadReplaceFile { .. }));
        assert!(resolver.create_default_context().is_empty());

        cleanup_temp_dir(&root);
    }

    #[test]
    fn configured_default_context_is_used_when_unbound() {
        let root = create_temp_dir();
        let layer = root.join("a.usda");
        touch(&layer);
        touch(&root.join("b_v2.usda"));

        let mut resolver = Resolver::new(ResolverConfig::default().with_default_search_path([&root]));
        resolver
            .configure_resolver_for_asset(&layer, Some(&pairs(&["b_v1.usda", "b_v2.usda"])))
            .unwrap();

        assert_eq!(resolver.resolve("b_v1.usda"), Some(root.join("b_v2.usda")));
        assert_eq!(resolver.create_default_context().replace_pairs().len(), 1);

        cleanup_temp_dir(&root);
    }

    #[test]
    fn anchoring() {
        let resolver = bare_resolver();

        assert_eq!(
            resolver.anchor_relative_path("/assets/b/v2/b.usda", "../v1/b.usda"),
            "/assets/b/v1/b.usda"
        );
        assert_eq!(
            resolver.anchor_relative_path("/assets/b/v2/", "./b.usda"),
            "/assets/b/v2/b.usda"
        );
        assert_eq!(
            resolver.anchor_relative_path("/assets/a.usda", "component/c.usda"),
            "/assets/component/c.usda"
        );
        // Relative anchors and absolute paths are left alone.
        assert_eq!(resolver.anchor_relative_path("rel/a.usda", "./b.usda"), "./b.usda");
        assert_eq!(resolver.anchor_relative_path("/a/a.usda", "/b/b.usda"), "/b/b.usda");
    }

    #[test]
    fn path_classification() {
        let resolver = bare_resolver();

        assert!(resolver.is_search_path("assembly/b/v1/b.usda"));
        assert!(!resolver.is_search_path("./b.usda"));
        assert!(!resolver.is_search_path("../b.usda"));
        assert!(!resolver.is_search_path("/abs/b.usda"));
        assert!(!resolver.is_relative_path(""));
        assert!(resolver.is_file_relative("../v1/b.usda"));

        assert_eq!(resolver.compute_normalized_path("/a/./b//c/../d"), "/a/b/d");
        assert_eq!(resolver.compute_normalized_path("../x/./y"), "../x/y");
        assert_eq!(resolver.compute_normalized_path("/.."), "/");
        assert_eq!(resolver.get_extension("a/b.usda"), "usda");
        assert_eq!(resolver.get_extension("a/b"), "");
    }

    #[test]
    fn modification_timestamp() {
        let root = create_temp_dir();
        let file = root.join("a.usda");
        touch(&file);

        let resolver = bare_resolver();
        assert!(resolver.get_modification_timestamp(&file).is_some());
        assert!(resolver.get_modification_timestamp(&root.join("missing")).is_none());

        cleanup_temp_dir(&root);
    }
}
