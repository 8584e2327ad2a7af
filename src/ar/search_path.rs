use std::path::{Path, PathBuf};

/// Ordered list of absolute directories that search-path identifiers are
/// anchored to. The first directory containing the asset wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Build a search path, anchoring relative entries to the current working
    /// directory. Empty entries are dropped.
    ///
    /// Anchoring happens here once; later changes of the working directory do
    /// not affect an existing search path.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut out = Vec::new();
        for root in roots {
            let root = root.as_ref();
            if root.as_os_str().is_empty() {
                continue;
            }

            match std::path::absolute(root) {
                Ok(abs) => out.push(abs),
                Err(err) => {
                    log::warn!(
                        "Could not determine absolute path for search path prefix '{}': {err}",
                        root.display()
                    );
                }
            }
        }

        Self { roots: out }
    }

    #[inline]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Find the first `root/identifier` that is an existing regular file.
    ///
    /// Roots that do not exist are skipped silently.
    pub fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        if identifier.is_empty() {
            return None;
        }

        self.roots
            .iter()
            .map(|root| root.join(identifier))
            .find(|candidate| candidate.is_file())
    }
}
