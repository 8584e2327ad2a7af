use anyhow::{bail, ensure, Result};
use std::fmt;

/// Scene description path addressing a prim (`/World/Chair`) or a property
/// (`/World/Chair.color`).
///
/// An empty path is valid and means "no path", which is how a reference
/// without an explicit target prim is expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
    /// Parse a path string.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Ok(Path(path));
        }

        ensure!(
            !path.chars().any(char::is_whitespace),
            "Path must not contain whitespace: {path:?}"
        );
        ensure!(!path.contains("//"), "Path has an empty component: {path:?}");
        if path.len() > 1 && path.ends_with('/') {
            bail!("Path must not end with '/': {path:?}");
        }

        Ok(Path(path))
    }

    /// The pseudo-root path `/`.
    pub fn abs_root() -> Self {
        Path("/".to_owned())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn is_abs_root(&self) -> bool {
        self.0 == "/"
    }

    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Returns true when the path names a property rather than a prim.
    pub fn is_property_path(&self) -> bool {
        let last = self.0.rsplit('/').next().unwrap_or_default();
        last.contains('.')
    }

    /// Append a child prim name.
    pub fn append_path(&self, name: &str) -> Result<Self> {
        ensure!(!name.is_empty(), "Prim name must not be empty");
        ensure!(
            !name.contains(['/', '.']),
            "Prim name must not contain separators: {name:?}"
        );
        ensure!(!self.is_property_path(), "Cannot append a prim to property path {self}");

        if self.is_abs_root() {
            Ok(Path(format!("/{name}")))
        } else {
            Ok(Path(format!("{}/{name}", self.0)))
        }
    }

    /// Append a property name to a prim path.
    pub fn append_property(&self, name: &str) -> Result<Self> {
        ensure!(!name.is_empty(), "Property name must not be empty");
        ensure!(
            !self.is_abs_root() && !self.is_empty(),
            "Properties can only be appended to prim paths, got {self:?}"
        );
        ensure!(!self.is_property_path(), "Cannot append a property to property path {self}");

        Ok(Path(format!("{}.{name}", self.0)))
    }

    /// The prim this path belongs to (itself for prim paths).
    pub fn prim_path(&self) -> Path {
        if !self.is_property_path() {
            return self.clone();
        }

        let split = self.0.rfind('/').unwrap_or(0);
        let dot = self.0[split..].find('.').map(|i| split + i).unwrap_or(self.0.len());
        Path(self.0[..dot].to_owned())
    }

    /// The parent path, or `None` for the pseudo-root and empty paths.
    pub fn parent(&self) -> Option<Path> {
        if self.is_empty() || self.is_abs_root() {
            return None;
        }

        if self.is_property_path() {
            return Some(self.prim_path());
        }

        match self.0.rfind('/') {
            Some(0) => Some(Path::abs_root()),
            Some(i) => Some(Path(self.0[..i].to_owned())),
            None => None,
        }
    }

    /// Last path component (prim or property name).
    pub fn name(&self) -> &str {
        if self.is_property_path() {
            let prim_len = self.prim_path().0.len();
            return &self.0[prim_len + 1..];
        }

        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns true if `prefix` equals this path or is one of its ancestors.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        if prefix.is_abs_root() {
            return self.is_absolute();
        }

        match self.0.strip_prefix(prefix.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/') || rest.starts_with('.'),
            None => false,
        }
    }

    /// Re-root this path from `old_prefix` onto `new_prefix`.
    ///
    /// Returns `None` when this path is not under `old_prefix`.
    pub fn replace_prefix(&self, old_prefix: &Path, new_prefix: &Path) -> Option<Path> {
        if !self.has_prefix(old_prefix) {
            return None;
        }

        let rest = if old_prefix.is_abs_root() {
            &self.0[1..]
        } else {
            &self.0[old_prefix.0.len()..]
        };

        if rest.is_empty() {
            return Some(new_prefix.clone());
        }

        let joined = if new_prefix.is_abs_root() {
            format!("/{}", rest.trim_start_matches('/'))
        } else if old_prefix.is_abs_root() {
            format!("{}/{rest}", new_prefix.0)
        } else {
            format!("{}{rest}", new_prefix.0)
        };

        Some(Path(joined))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_prims_and_properties() -> Result<()> {
        let root = Path::abs_root();
        let world = root.append_path("World")?;
        assert_eq!(world.as_str(), "/World");

        let chair = world.append_path("Chair")?;
        let color = chair.append_property("primvars:color")?;
        assert_eq!(color.as_str(), "/World/Chair.primvars:color");
        assert!(color.is_property_path());
        assert_eq!(color.prim_path(), chair);
        assert_eq!(color.name(), "primvars:color");
        assert_eq!(chair.name(), "Chair");

        assert!(root.append_property("x").is_err());
        assert!(color.append_path("Nope").is_err());
        Ok(())
    }

    #[test]
    fn parents() -> Result<()> {
        let path = Path::new("/a/b.c")?;
        assert_eq!(path.parent(), Some(Path::new("/a/b")?));
        assert_eq!(Path::new("/a")?.parent(), Some(Path::abs_root()));
        assert_eq!(Path::abs_root().parent(), None);
        Ok(())
    }

    #[test]
    fn prefix_replacement() -> Result<()> {
        let src = Path::new("/c")?;
        let dst = Path::new("/b")?;

        assert_eq!(Path::new("/c")?.replace_prefix(&src, &dst), Some(dst.clone()));
        assert_eq!(
            Path::new("/c/Geom.points")?.replace_prefix(&src, &dst),
            Some(Path::new("/b/Geom.points")?)
        );
        assert_eq!(Path::new("/c.x")?.replace_prefix(&src, &dst), Some(Path::new("/b.x")?));

        // `/cube` is not under `/c`
        assert_eq!(Path::new("/cube")?.replace_prefix(&src, &dst), None);
        Ok(())
    }

    #[test]
    fn reject_malformed() {
        assert!(Path::new("/a//b").is_err());
        assert!(Path::new("/a/").is_err());
        assert!(Path::new("/a b").is_err());
        assert!(Path::new("").unwrap().is_empty());
    }
}
