//! Layer composition driven by the replace resolver.
//!
//! This module composes the arcs that pull other layers in:
//! - **sublayers**, stacked at the layer level (earlier entries are stronger);
//! - **references** and **payloads**, whose target prim is grafted under the
//!   referencing prim with weaker strength than local opinions.
//!
//! Every asset path met on the way is handed to [`Resolver`], so the replace
//! pairs of the context bound for the session redirect arcs in every layer,
//! however deep. File-relative paths (`./`, `../`) are anchored to the layer
//! that authored them first.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ar::{current_context, with_context, Resolver, ResolverContext, ResolverContextBinder};
use crate::sdf::{
    schema::{ChildrenKey, FieldKey},
    ListOp, Path as SdfPath, Spec, Value,
};
use crate::usda::TextReader;

type Specs = HashMap<SdfPath, Spec>;

/// A layer with its sublayers, references and payloads composed in.
#[derive(Debug)]
pub struct ComposedLayer {
    /// The composed specs.
    pub specs: Specs,
    /// The root layer file.
    pub source_path: PathBuf,
    /// Every layer file that contributed, weakest first.
    pub composed_layers: Vec<PathBuf>,
    /// Arc asset paths that could not be resolved, as authored.
    pub unresolved_assets: Vec<String>,
    /// The context that was bound while composing.
    pub context: ResolverContext,
}

impl ComposedLayer {
    /// Open a layer without a caller supplied context.
    ///
    /// If the calling thread already has a context bound it is used as is.
    /// Otherwise a context is bootstrapped for the root layer: search path
    /// from `PXR_AR_DEFAULT_SEARCH_PATH`, replace pairs from the layer's
    /// `customLayerData` and from a `replace.json` next to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_resolver(path, &Resolver::from_env(), None)
    }

    /// Open a layer with `context` bound for the whole composition.
    pub fn open_with_context(path: impl AsRef<Path>, context: &ResolverContext) -> Result<Self> {
        Self::open_with_resolver(path, &Resolver::from_env(), Some(context))
    }

    /// Open a layer with an explicit resolver and optional context.
    pub fn open_with_resolver(
        path: impl AsRef<Path>,
        resolver: &Resolver,
        context: Option<&ResolverContext>,
    ) -> Result<Self> {
        let path = path.as_ref();

        let (root, context) = match context.cloned().or_else(|| current_context().map(|ctx| (*ctx).clone())) {
            Some(context) => {
                let root = with_context(context.clone(), || Self::locate_root(path, resolver))?;
                (root, context)
            }
            None => {
                let root = Self::locate_root(path, resolver)?;
                let reader = TextReader::read(&root)?;
                let context = resolver
                    .create_default_context_for_asset(&root, Some(&reader))
                    .with_context(|| format!("Unable to create resolver context for {}", root.display()))?;
                (root, context)
            }
        };

        let _binder = ResolverContextBinder::new(context.clone());

        let mut composer = Composer::new(resolver);
        let specs = composer.compose(&root)?;

        Ok(ComposedLayer {
            specs,
            source_path: root,
            composed_layers: composer.composed_layers,
            unresolved_assets: composer.unresolved_assets,
            context,
        })
    }

    /// Find the root layer: an existing file, or an identifier the resolver
    /// can find with the currently bound context.
    fn locate_root(path: &Path, resolver: &Resolver) -> Result<PathBuf> {
        if path.is_file() {
            return path
                .canonicalize()
                .with_context(|| format!("Failed to canonicalize path: {}", path.display()));
        }

        let identifier = path.to_string_lossy();
        match resolver.resolve(&identifier) {
            Some(resolved) => Ok(canonical(resolved)),
            None => bail!("Unable to find layer {identifier}"),
        }
    }

    /// Get a reference to a spec by path.
    pub fn get(&self, path: &SdfPath) -> Option<&Spec> {
        self.specs.get(path)
    }

    /// Check if a spec exists at the given path.
    pub fn has_spec(&self, path: &SdfPath) -> bool {
        self.specs.contains_key(path)
    }

    /// A field of the prim at `prim`.
    pub fn prim_field(&self, prim: &SdfPath, key: impl AsRef<str>) -> Option<&Value> {
        self.specs.get(prim)?.get(key)
    }

    /// The default value of attribute `name` on `prim`.
    pub fn attribute_value(&self, prim: &SdfPath, name: &str) -> Option<&Value> {
        let path = prim.append_property(name).ok()?;
        self.specs.get(&path)?.get(FieldKey::Default)
    }
}

/// State of one composition session.
struct Composer<'r> {
    resolver: &'r Resolver,
    /// Layers currently being composed, used to cut cycles.
    stack: Vec<PathBuf>,
    composed_layers: Vec<PathBuf>,
    unresolved_assets: Vec<String>,
}

impl<'r> Composer<'r> {
    fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            composed_layers: Vec::new(),
            unresolved_assets: Vec::new(),
        }
    }

    /// Compose the layer stack rooted at `path`, then its references and payloads.
    fn compose(&mut self, path: &Path) -> Result<Specs> {
        if !self.enter(path) {
            return Ok(Specs::new());
        }

        let result = self.compose_layer_stack(path).and_then(|mut specs| {
            self.apply_arcs(&mut specs)?;
            Ok(specs)
        });

        self.stack.pop();
        result
    }

    fn enter(&mut self, path: &Path) -> bool {
        if self.stack.iter().any(|p| p == path) {
            log::warn!("Skipping cyclic layer dependency on {}", path.display());
            return false;
        }
        self.stack.push(path.to_path_buf());
        true
    }

    /// Merge `path` with its sublayers. `path` must already be on the stack.
    fn compose_layer_stack(&mut self, path: &Path) -> Result<Specs> {
        log::debug!("Composing layer {}", path.display());

        let mut specs = TextReader::read(path)
            .with_context(|| format!("Failed to read layer: {}", path.display()))?
            .into_specs();
        self.anchor_arcs(&mut specs, path);

        let mut composed = Specs::new();

        // Later sublayers are weaker: merge them first.
        for sublayer in extract_sublayer_paths(&specs).iter().rev() {
            let Some(resolved) = self.resolve_arc(path, sublayer) else {
                continue;
            };
            if !self.enter(&resolved) {
                continue;
            }

            let sublayer_specs = self.compose_layer_stack(&resolved);
            self.stack.pop();

            let sublayer_specs =
                sublayer_specs.with_context(|| format!("Failed to compose sublayer {sublayer}"))?;
            for (spec_path, spec) in sublayer_specs {
                merge_spec(&mut composed, spec_path, spec, Strength::Stronger);
            }
        }

        for (spec_path, spec) in specs {
            merge_spec(&mut composed, spec_path, spec, Strength::Stronger);
        }

        self.composed_layers.push(path.to_path_buf());
        Ok(composed)
    }

    /// Rewrite file-relative arc asset paths to absolute ones, anchored to `layer_path`.
    fn anchor_arcs(&self, specs: &mut Specs, layer_path: &Path) {
        let anchor = layer_path.to_string_lossy();
        let anchor_asset = |asset_path: &mut String| {
            if self.resolver.is_file_relative(asset_path) {
                *asset_path = self.resolver.anchor_relative_path(&anchor, asset_path);
            }
        };

        for spec in specs.values_mut() {
            if let Some(Value::ReferenceListOp(list)) = spec.fields.get_mut(FieldKey::References.as_str()) {
                for_each_item(list, |reference| anchor_asset(&mut reference.asset_path));
            }
            if let Some(Value::PayloadListOp(list)) = spec.fields.get_mut(FieldKey::Payload.as_str()) {
                for_each_item(list, |payload| anchor_asset(&mut payload.asset_path));
            }
        }
    }

    /// Graft referenced and payload prims under every prim that authors them.
    fn apply_arcs(&mut self, specs: &mut Specs) -> Result<()> {
        let mut arc_prims: Vec<SdfPath> = specs
            .iter()
            .filter(|(_, spec)| {
                spec.fields.contains_key(FieldKey::References.as_str())
                    || spec.fields.contains_key(FieldKey::Payload.as_str())
            })
            .map(|(path, _)| path.clone())
            .collect();

        // Parents before children, so nested arcs land on already grafted prims.
        arc_prims.sort();

        for prim_path in arc_prims {
            for (asset_path, source_prim) in collect_arcs(&specs[&prim_path]) {
                self.apply_arc(specs, &prim_path, &asset_path, &source_prim)
                    .with_context(|| format!("Unable to compose arc to @{asset_path}@ on {prim_path}"))?;
            }
        }

        Ok(())
    }

    fn apply_arc(
        &mut self,
        specs: &mut Specs,
        prim_path: &SdfPath,
        asset_path: &str,
        source_prim: &SdfPath,
    ) -> Result<()> {
        let source = if asset_path.is_empty() {
            specs.clone()
        } else {
            let Some(resolved) = self.resolve_arc(Path::new(""), asset_path) else {
                return Ok(());
            };
            self.compose(&resolved)?
        };

        let source_prim = if source_prim.is_empty() {
            match default_prim(&source) {
                Some(default) => default,
                None => {
                    log::warn!("@{asset_path}@ has no default prim and no prim path was given");
                    return Ok(());
                }
            }
        } else {
            source_prim.clone()
        };

        for (spec_path, spec) in source {
            if spec_path.is_abs_root() {
                continue;
            }
            if let Some(mapped) = spec_path.replace_prefix(&source_prim, prim_path) {
                merge_spec(specs, mapped, spec, Strength::Weaker);
            }
        }

        Ok(())
    }

    /// Resolve an arc asset path with the bound context.
    ///
    /// File-relative paths are anchored to `anchor` first.
    fn resolve_arc(&mut self, anchor: &Path, asset_path: &str) -> Option<PathBuf> {
        let identifier = if self.resolver.is_file_relative(asset_path) {
            self.resolver
                .anchor_relative_path(&anchor.to_string_lossy(), asset_path)
        } else {
            asset_path.to_owned()
        };

        match self.resolver.resolve(&identifier) {
            Some(resolved) => Some(canonical(resolved)),
            None => {
                log::warn!("Unable to resolve asset path @{asset_path}@");
                self.unresolved_assets.push(asset_path.to_owned());
                None
            }
        }
    }
}

/// Which side wins when a spec lands on a path that already has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strength {
    Stronger,
    Weaker,
}

/// Merge `incoming` into the spec at `path`, field by field.
///
/// Children lists are unioned, dictionaries merge key-wise and list ops
/// are combined; every other field is taken from the stronger side.
fn merge_spec(composed: &mut Specs, path: SdfPath, incoming: Spec, strength: Strength) {
    let Some(existing) = composed.get_mut(&path) else {
        composed.insert(path, incoming);
        return;
    };

    for (key, value) in incoming.fields {
        match existing.fields.remove(&key) {
            None => {
                existing.fields.insert(key, value);
            }
            Some(current) => {
                let merged = match strength {
                    Strength::Stronger => merge_value(&key, value, current),
                    Strength::Weaker => merge_value(&key, current, value),
                };
                existing.fields.insert(key, merged);
            }
        }
    }
}

fn merge_value(key: &str, stronger: Value, weaker: Value) -> Value {
    let is_children = key == ChildrenKey::PrimChildren.as_str() || key == ChildrenKey::PropertyChildren.as_str();

    match (stronger, weaker) {
        (Value::TokenVec(mut strong), Value::TokenVec(weak)) if is_children => {
            for name in weak {
                if !strong.contains(&name) {
                    strong.push(name);
                }
            }
            Value::TokenVec(strong)
        }
        (Value::Dictionary(mut strong), Value::Dictionary(weak)) => {
            for (entry, weak_value) in weak {
                let merged = match strong.remove(&entry) {
                    Some(strong_value) => merge_value(&entry, strong_value, weak_value),
                    None => weak_value,
                };
                strong.insert(entry, merged);
            }
            Value::Dictionary(strong)
        }
        (Value::ReferenceListOp(strong), Value::ReferenceListOp(weak)) => Value::ReferenceListOp(strong.compose_over(&weak)),
        (Value::PayloadListOp(strong), Value::PayloadListOp(weak)) => Value::PayloadListOp(strong.compose_over(&weak)),
        (Value::TokenListOp(strong), Value::TokenListOp(weak)) => Value::TokenListOp(strong.compose_over(&weak)),
        (strong, _) => strong,
    }
}

fn for_each_item<T>(list: &mut ListOp<T>, mut f: impl FnMut(&mut T)) {
    for items in [
        &mut list.explicit_items,
        &mut list.added_items,
        &mut list.prepended_items,
        &mut list.appended_items,
        &mut list.deleted_items,
        &mut list.ordered_items,
    ] {
        items.iter_mut().for_each(&mut f);
    }
}

/// `(asset path, prim path)` of every reference then every payload on `spec`, strongest first.
fn collect_arcs(spec: &Spec) -> Vec<(String, SdfPath)> {
    let mut arcs = Vec::new();

    if let Some(Value::ReferenceListOp(list)) = spec.get(FieldKey::References) {
        arcs.extend(list.items().into_iter().map(|r| (r.asset_path, r.prim_path)));
    }
    if let Some(Value::PayloadListOp(list)) = spec.get(FieldKey::Payload) {
        arcs.extend(list.items().into_iter().map(|p| (p.asset_path, p.prim_path)));
    }

    arcs
}

/// Extract sublayer paths from the pseudo-root spec.
fn extract_sublayer_paths(specs: &Specs) -> Vec<String> {
    specs
        .get(&SdfPath::abs_root())
        .and_then(|root| root.get(FieldKey::SubLayers))
        .and_then(Value::as_string_slice)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

fn default_prim(specs: &Specs) -> Option<SdfPath> {
    let name = specs.get(&SdfPath::abs_root())?.get(FieldKey::DefaultPrim)?.as_str()?;
    SdfPath::abs_root().append_path(name).ok()
}

fn canonical(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}
