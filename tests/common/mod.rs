//! Versioned asset tree shared by the integration tests.
//!
//! ```text
//! assembly/a/v1/a.usda     assembly/b/v1/b.usda     component/c/v1/c.usda
//! /a  ---(ref)--->         /b  ---(ref)--->         /c  c = "c_v1"
//!
//!                          assembly/b/v2/b.usda     component/c/v2/c.usda
//!                          sublayers b/v1           sublayers c/v1
//!                          /b  b = "b_v2"           /c  c = "c_v2"
//!
//! assembly/a/v2/a.usda
//! customLayerData.replacePairs = [c/v1 -> c/v2, b/v1 -> b/v2]
//! sublayers a/v1
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const C_V1: &str = "component/c/v1/c.usda";
pub const C_V2: &str = "component/c/v2/c.usda";
pub const B_V1: &str = "assembly/b/v1/b.usda";
pub const B_V2: &str = "assembly/b/v2/b.usda";
pub const A_V1: &str = "assembly/a/v1/a.usda";
pub const A_V2: &str = "assembly/a/v2/a.usda";

pub fn create_temp_dir() -> PathBuf {
    let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "replace_resolver_it_{}_{}_{}",
        std::process::id(),
        counter,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

pub fn cleanup_temp_dir(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write file");
}

/// Write the versioned a/b/c asset tree under `root`.
pub fn prep_assets(root: &Path) {
    write_file(
        &root.join(C_V1),
        r#"#usda 1.0
(
    defaultPrim = "c"
)

def "c" (
    assetInfo = {
        asset identifier = @component/c/v1/c.usda@
        string name = "c"
        string version = "v1"
    }
    kind = "component"
)
{
    custom string c = "c_v1"
}
"#,
    );

    write_file(
        &root.join(C_V2),
        r#"#usda 1.0
(
    defaultPrim = "c"
    subLayers = [
        @../v1/c.usda@
    ]
)

over "c" (
    assetInfo = {
        asset identifier = @component/c/v2/c.usda@
        string name = "c"
        string version = "v2"
    }
)
{
    custom string c = "c_v2"
}
"#,
    );

    write_file(
        &root.join(B_V1),
        r#"#usda 1.0
(
    defaultPrim = "b"
)

def "b" (
    kind = "assembly"
    prepend references = @component/c/v1/c.usda@
)
{
}
"#,
    );

    write_file(
        &root.join(B_V2),
        r#"#usda 1.0
(
    defaultPrim = "b"
    subLayers = [
        @../v1/b.usda@
    ]
)

over "b" (
    kind = "assembly"
)
{
    custom string b = "b_v2"
}
"#,
    );

    write_file(
        &root.join(A_V1),
        r#"#usda 1.0
(
    defaultPrim = "a"
)

def "a" (
    kind = "assembly"
    prepend references = @assembly/b/v1/b.usda@
)
{
}
"#,
    );

    write_file(
        &root.join(A_V2),
        r#"#usda 1.0
(
    customLayerData = {
        string[] replacePairs = ["component/c/v1/c.usda", "component/c/v2/c.usda", "assembly/b/v1/b.usda", "assembly/b/v2/b.usda"]
    }
    subLayers = [
        @../v1/a.usda@
    ]
)
"#,
    );
}
