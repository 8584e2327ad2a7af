use std::fmt;
use std::path::Path;

use super::replace::ReplacePairs;
use super::search_path::SearchPath;

/// Everything the resolver needs to turn an identifier into a file: a search
/// path and a replace pair table.
///
/// Contexts are plain values. Two contexts with the same roots and the same
/// pairs compare equal and hash identically, which lets callers detect when a
/// different context would change resolution results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverContext {
    search_path: SearchPath,
    replace_pairs: ReplacePairs,
}

impl ResolverContext {
    /// Create a context over `roots` with no replace pairs.
    ///
    /// Relative roots are anchored to the current working directory now.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::from_parts(SearchPath::new(roots), ReplacePairs::default())
    }

    pub fn from_parts(search_path: SearchPath, replace_pairs: ReplacePairs) -> Self {
        Self {
            search_path,
            replace_pairs,
        }
    }

    /// Redirect `source` to `target`. Earlier pairs win over later ones with
    /// the same source.
    pub fn add_replace_pair(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.replace_pairs.add(source, target);
    }

    /// Builder form of [`add_replace_pair`](Self::add_replace_pair).
    pub fn with_replace_pair(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_replace_pair(source, target);
        self
    }

    /// Append every pair from `pairs`, keeping their order.
    pub fn extend_replace_pairs(&mut self, pairs: &ReplacePairs) {
        self.replace_pairs.extend(pairs.iter());
    }

    #[inline]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    #[inline]
    pub fn replace_pairs(&self) -> &ReplacePairs {
        &self.replace_pairs
    }

    /// Returns true when the context has neither roots nor pairs.
    pub fn is_empty(&self) -> bool {
        self.search_path.is_empty() && self.replace_pairs.is_empty()
    }
}

impl fmt::Display for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Search path: ")?;
        if self.search_path.is_empty() {
            f.write_str("[ ]")?;
        } else {
            f.write_str("[")?;
            for root in self.search_path.roots() {
                write!(f, "\n    {}", root.display())?;
            }
            f.write_str("\n]")?;
        }

        if !self.replace_pairs.is_empty() {
            f.write_str("\nReplace pairs: [")?;
            for (source, target) in self.replace_pairs.iter() {
                write!(f, "\n    {source}: {target}")?;
            }
            f.write_str("\n]")?;
        }

        Ok(())
    }
}
