//! Asset resolution CLI tool.
//!
//! Resolves asset identifiers the way a composition would, with explicit
//! search roots and replace pairs or with the environment bootstrap.
//! With `--layer`, opens and composes a layer instead and prints the result.
//!
//! ```text
//! resolve_usd -r /assets -p component/c/v1/c.usda=component/c/v2/c.usda component/c/v1/c.usda
//! resolve_usd --layer /assets/assembly/a/v2/a.usda
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use rayon::prelude::*;

use replace_resolver::ar::{ReplacePairs, Resolver, ResolverConfig, ResolverContext, ResolverContextBinder};
use replace_resolver::composition::ComposedLayer;
use replace_resolver::sdf::{self, schema::FieldKey};

/// Resolve USD asset identifiers through search roots and replace pairs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Asset identifiers to resolve.
    #[arg(value_name = "IDENTIFIERS")]
    identifiers: Vec<String>,

    /// Search root (can be specified multiple times). Defaults to PXR_AR_DEFAULT_SEARCH_PATH.
    #[arg(long = "root", short = 'r', value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Replace pair SRC=DST (can be specified multiple times).
    #[arg(long = "replace", short = 'p', value_name = "SRC=DST", value_parser = parse_pair)]
    replace: Vec<(String, String)>,

    /// Load replace pairs from a JSON file in replace.json format.
    #[arg(long, value_name = "FILE")]
    replace_file: Option<PathBuf>,

    /// Open and compose this layer instead of resolving identifiers.
    #[arg(long, short = 'l', value_name = "FILE")]
    layer: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((source, target)) if !source.is_empty() && !target.is_empty() => {
            Ok((source.to_owned(), target.to_owned()))
        }
        _ => Err(format!("expected SRC=DST, got {value:?}")),
    }
}

impl Args {
    /// The context described on the command line, if any option describes one.
    fn context(&self, resolver: &Resolver) -> Result<Option<ResolverContext>> {
        if self.roots.is_empty() && self.replace.is_empty() && self.replace_file.is_none() {
            return Ok(None);
        }

        let mut context = if self.roots.is_empty() {
            resolver.fallback_context().clone()
        } else {
            ResolverContext::new(&self.roots)
        };

        context.extend_replace_pairs(&self.replace.iter().cloned().collect::<ReplacePairs>());

        if let Some(file) = &self.replace_file {
            if !file.is_file() {
                bail!("Replace file not found: {}", file.display());
            }
            let pairs = ReplacePairs::read_sidecar(file)?;
            context.extend_replace_pairs(&pairs);
        }

        Ok(Some(context))
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(level)).init();

    let result = if let Some(layer) = &args.layer {
        run_layer(&args, layer)
    } else {
        run_resolve(&args)
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Resolve every identifier, returning false if any stayed unresolved.
fn run_resolve(args: &Args) -> Result<bool> {
    if args.identifiers.is_empty() {
        bail!("Nothing to resolve: pass identifiers or --layer");
    }

    let resolver = Resolver::new(ResolverConfig::from_env());
    let context = args.context(&resolver)?;

    if let Some(context) = &context {
        println!("{context}\n");
    }

    let unresolved = AtomicUsize::new(0);

    // Bindings are per thread: each worker binds the context for itself.
    let results: Vec<(String, Option<PathBuf>)> = args
        .identifiers
        .par_iter()
        .map(|identifier| {
            let _binder = context.clone().map(ResolverContextBinder::new);
            let resolved = resolver.resolve(identifier);
            if resolved.is_none() {
                unresolved.fetch_add(1, Ordering::Relaxed);
            }
            (identifier.clone(), resolved)
        })
        .collect();

    for (identifier, resolved) in &results {
        match resolved {
            Some(path) => {
                let modified = resolver
                    .get_modification_timestamp(path)
                    .and_then(|t| t.elapsed().ok())
                    .map(|age| format!(" (modified {}s ago)", age.as_secs()))
                    .unwrap_or_default();
                println!("{identifier} -> {}{modified}", path.display());
            }
            None => println!("{identifier} -> <unresolved>"),
        }
    }

    Ok(unresolved.load(Ordering::Relaxed) == 0)
}

/// Compose `layer` and print every prim with its attribute values.
fn run_layer(args: &Args, layer: &Path) -> Result<bool> {
    let resolver = Resolver::new(ResolverConfig::from_env());
    let context = args.context(&resolver)?;

    let composed = ComposedLayer::open_with_resolver(layer, &resolver, context.as_ref())
        .with_context(|| format!("Failed to open {}", layer.display()))?;

    println!("{}\n", composed.context);
    println!("Layers:");
    for path in &composed.composed_layers {
        println!("  {}", path.display());
    }
    println!();

    // Group attributes under their prim, sorted for stable output.
    let mut prims: BTreeMap<&str, Vec<(&str, String)>> = BTreeMap::new();
    for (path, spec) in &composed.specs {
        match spec.ty {
            sdf::SpecType::Prim => {
                prims.entry(path.as_str()).or_default();
            }
            sdf::SpecType::Attribute => {
                let value = spec
                    .get(FieldKey::Default)
                    .map(|v| format!("{v:?}"))
                    .unwrap_or_else(|| "<none>".to_owned());
                let prim = path.as_str().rsplit_once('.').map_or(path.as_str(), |(prim, _)| prim);
                prims.entry(prim).or_default().push((path.name(), value));
            }
            sdf::SpecType::PseudoRoot => {}
        }
    }

    for (prim, mut attributes) in prims {
        println!("{prim}");
        attributes.sort();
        for (name, value) in attributes {
            println!("    .{name} = {value}");
        }
    }

    if !composed.unresolved_assets.is_empty() {
        println!("\nUnresolved assets:");
        for asset in &composed.unresolved_assets {
            println!("  - @{asset}@");
        }
        return Ok(false);
    }

    Ok(true)
}
