//! End-to-end resolution over a versioned asset tree.

mod common;

use std::path::Path;

use common::*;
use replace_resolver::ar::{
    current_context, tokens, Resolver, ResolverConfig, ResolverContext, ResolverContextBinder, ResolverError,
};
use replace_resolver::composition::ComposedLayer;
use replace_resolver::sdf::{self, schema::FieldKey, Value};

fn explicit_resolver() -> Resolver {
    Resolver::new(ResolverConfig::default())
}

/// A resolver whose fallback search path is `root`, as if set through the environment.
fn env_resolver(root: &Path) -> Resolver {
    Resolver::new(ResolverConfig::default().with_env_search_path(root.as_os_str()))
}

fn both_pairs(root: &Path) -> ResolverContext {
    ResolverContext::new([root])
        .with_replace_pair(C_V1, C_V2)
        .with_replace_pair(B_V1, B_V2)
}

fn string_attr<'a>(layer: &'a ComposedLayer, prim: &str, name: &str) -> Option<&'a str> {
    layer
        .attribute_value(&sdf::path(prim).unwrap(), name)
        .and_then(Value::as_str)
}

/// The composed prim carries the asset info of c/v2.
fn assert_c_v2_asset_info(layer: &ComposedLayer, prim: &str) {
    let info = layer
        .prim_field(&sdf::path(prim).unwrap(), FieldKey::AssetInfo)
        .and_then(|v| v.try_as_dictionary_ref())
        .expect("assetInfo dictionary");

    assert_eq!(info.get("name"), Some(&Value::String("c".into())));
    assert_eq!(info.get("version"), Some(&Value::String("v2".into())));
    assert_eq!(info.get("identifier"), Some(&Value::AssetPath(C_V2.into())));
}

fn assert_fully_replaced(layer: &ComposedLayer) {
    assert!(layer.has_spec(&sdf::path("/a").unwrap()));
    assert_eq!(string_attr(layer, "/a", "c"), Some("c_v2"));
    assert_eq!(string_attr(layer, "/a", "b"), Some("b_v2"));
    assert_eq!(
        layer.prim_field(&sdf::path("/a").unwrap(), FieldKey::Kind),
        Some(&Value::Token("assembly".into()))
    );
    assert_c_v2_asset_info(layer, "/a");
    assert!(layer.unresolved_assets.is_empty(), "{:?}", layer.unresolved_assets);
}

#[test]
fn test_resolve_with_context() {
    let root = create_temp_dir();
    prep_assets(&root);

    let resolver = explicit_resolver();
    {
        let _binder = ResolverContextBinder::new(both_pairs(&root));

        assert_eq!(resolver.resolve(C_V1), Some(root.join(C_V2)));
        assert_eq!(resolver.resolve(B_V1), Some(root.join(B_V2)));
        assert_eq!(resolver.resolve(A_V1), Some(root.join(A_V1)));
    }

    // Unbound with an empty fallback: nothing to search.
    assert!(current_context().is_none());
    assert_eq!(resolver.resolve(C_V1), None);

    cleanup_temp_dir(&root);
}

#[test]
fn test_resolve_is_deterministic() {
    let root = create_temp_dir();
    prep_assets(&root);

    let resolver = explicit_resolver();
    let with_b = ResolverContext::new([&root]).with_replace_pair(B_V1, B_V2);
    let with_both = both_pairs(&root);

    let first = resolver.resolve_with_context(B_V1, &with_b);
    for _ in 0..3 {
        assert_eq!(resolver.resolve_with_context(B_V1, &with_b), first);
    }
    // The c pair is irrelevant to b and must not change its result.
    assert_eq!(resolver.resolve_with_context(B_V1, &with_both), first);

    cleanup_temp_dir(&root);
}

#[test]
fn test_resolve_from_stage_one_level() {
    let root = create_temp_dir();
    prep_assets(&root);

    let context = ResolverContext::new([&root]).with_replace_pair(C_V1, C_V2);
    let layer = ComposedLayer::open_with_resolver(root.join(B_V1), &explicit_resolver(), Some(&context)).unwrap();

    assert_eq!(string_attr(&layer, "/b", "c"), Some("c_v2"));
    assert_eq!(
        layer.prim_field(&sdf::path("/b").unwrap(), FieldKey::Kind),
        Some(&Value::Token("assembly".into()))
    );
    assert_c_v2_asset_info(&layer, "/b");

    cleanup_temp_dir(&root);
}

#[test]
fn test_resolve_from_stage_two_levels() {
    let root = create_temp_dir();
    prep_assets(&root);

    let layer =
        ComposedLayer::open_with_resolver(root.join(A_V1), &explicit_resolver(), Some(&both_pairs(&root))).unwrap();

    assert_fully_replaced(&layer);

    cleanup_temp_dir(&root);
}

#[test]
fn test_without_pairs_original_versions_are_used() {
    let root = create_temp_dir();
    prep_assets(&root);

    let layer = ComposedLayer::open_with_resolver(root.join(A_V1), &env_resolver(&root), None).unwrap();

    assert_eq!(string_attr(&layer, "/a", "c"), Some("c_v1"));
    assert_eq!(string_attr(&layer, "/a", "b"), None);
    assert!(layer.context.replace_pairs().is_empty());

    cleanup_temp_dir(&root);
}

#[test]
fn test_replace_from_usd_file() {
    let root = create_temp_dir();
    prep_assets(&root);

    let layer = ComposedLayer::open_with_resolver(root.join(A_V2), &env_resolver(&root), None).unwrap();

    assert_fully_replaced(&layer);
    assert_eq!(layer.context.replace_pairs().len(), 2);

    cleanup_temp_dir(&root);
}

#[test]
fn test_replace_from_json_file() {
    let root = create_temp_dir();
    prep_assets(&root);

    let sidecar = root.join("assembly/a/v1").join(tokens::REPLACE_FILE_NAME);
    write_file(
        &sidecar,
        &serde_json::to_string(&[[C_V1, C_V2], [B_V1, B_V2]]).unwrap(),
    );

    let layer = ComposedLayer::open_with_resolver(root.join(A_V1), &env_resolver(&root), None).unwrap();

    assert_fully_replaced(&layer);

    cleanup_temp_dir(&root);
}

#[test]
fn test_metadata_pairs_win_over_sidecar() {
    let root = create_temp_dir();
    prep_assets(&root);

    // The sidecar maps c/v1 to itself; the metadata of a/v2 maps it to c/v2.
    write_file(
        &root.join("assembly/a/v2").join(tokens::REPLACE_FILE_NAME),
        &serde_json::to_string(&[[C_V1, C_V1]]).unwrap(),
    );

    let layer = ComposedLayer::open_with_resolver(root.join(A_V2), &env_resolver(&root), None).unwrap();

    assert_eq!(string_attr(&layer, "/a", "c"), Some("c_v2"));
    assert_eq!(layer.context.replace_pairs().len(), 3);

    cleanup_temp_dir(&root);
}

#[test]
fn test_malformed_sidecar_fails_open() {
    let root = create_temp_dir();
    prep_assets(&root);

    write_file(
        &root.join("assembly/a/v1").join(tokens::REPLACE_FILE_NAME),
        r#"[["component/c/v1/c.usda"]]"#,
    );

    let err = ComposedLayer::open_with_resolver(root.join(A_V1), &env_resolver(&root), None).unwrap_err();
    let resolver_err = err
        .downcast_ref::<ResolverError>()
        .expect("bootstrap error is a ResolverError");
    assert!(matches!(resolver_err, ResolverError::MalformedReplaceFile { .. }));

    // An explicit context skips the bootstrap entirely.
    let layer = ComposedLayer::open_with_resolver(root.join(A_V1), &explicit_resolver(), Some(&both_pairs(&root)));
    assert!(layer.is_ok());

    cleanup_temp_dir(&root);
}

#[test]
fn test_concurrent_compositions_are_isolated() {
    let root = create_temp_dir();
    prep_assets(&root);

    let resolver = env_resolver(&root);
    let replaced = ResolverContext::new([&root]).with_replace_pair(C_V1, C_V2);

    std::thread::scope(|scope| {
        let with_pairs = scope.spawn(|| {
            let _binder = ResolverContextBinder::new(replaced.clone());
            let layer = ComposedLayer::open_with_resolver(root.join(B_V1), &resolver, None).unwrap();
            string_attr(&layer, "/b", "c").map(str::to_owned)
        });
        let without_pairs = scope.spawn(|| {
            let layer = ComposedLayer::open_with_resolver(root.join(B_V1), &resolver, None).unwrap();
            string_attr(&layer, "/b", "c").map(str::to_owned)
        });

        assert_eq!(with_pairs.join().unwrap().as_deref(), Some("c_v2"));
        assert_eq!(without_pairs.join().unwrap().as_deref(), Some("c_v1"));
    });

    cleanup_temp_dir(&root);
}
