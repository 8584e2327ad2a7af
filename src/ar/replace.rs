//! Replace pairs: exact-match redirections from one asset identifier to another.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::ResolverError;
use super::tokens;

/// Read access to a layer's custom metadata.
///
/// Implemented by whatever owns the parsed layer; the resolver only ever
/// asks for a single string array.
pub trait LayerMetadata {
    /// Returns the string array stored under `key` in the layer's custom
    /// metadata, or `None` when the key is absent or holds another type.
    fn metadata_array(&self, key: &str) -> Option<Vec<String>>;
}

/// Ordered table of `(source, target)` identifier pairs.
///
/// Lookups compare identifiers by exact value. Duplicate sources are allowed;
/// the pair added first takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplacePairs {
    pairs: Vec<(String, String)>,
}

impl ReplacePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair.
    pub fn add(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.pairs.push((source.into(), target.into()));
    }

    /// Target of the first pair whose source equals `identifier`.
    pub fn lookup(&self, identifier: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(source, _)| source == identifier)
            .map(|(_, target)| target.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Interpret a flat `[s1, t1, s2, t2, ...]` array as consecutive pairs.
    ///
    /// An odd number of entries is treated as "no redirection configured".
    pub fn from_flat(values: &[String]) -> Self {
        if values.len() % 2 != 0 {
            log::warn!(
                "Ignoring {} metadata with an odd number of entries ({})",
                tokens::REPLACE_PAIRS,
                values.len()
            );
            return Self::default();
        }

        values
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }

    /// Load pairs from the reserved `replacePairs` entry of a layer's custom metadata.
    pub fn from_metadata(metadata: &dyn LayerMetadata) -> Self {
        match metadata.metadata_array(tokens::REPLACE_PAIRS) {
            Some(values) => {
                let pairs = Self::from_flat(&values);
                if !pairs.is_empty() {
                    log::debug!(target: "replace_resolver::replace", "Replace metadata found: {} pairs", pairs.len());
                }
                pairs
            }
            None => Self::default(),
        }
    }

    /// Parse a sidecar document: a JSON array of two-element string arrays.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let pairs: Vec<(String, String)> = serde_json::from_str(text)?;
        Ok(Self { pairs })
    }

    /// Read a sidecar file. A missing file yields an empty table.
    pub fn read_sidecar(path: &Path) -> Result<Self, ResolverError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ResolverError::ReadReplaceFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        log::debug!(target: "replace_resolver::replace", "Replace file found: \"{}\"", path.display());

        Self::from_json_str(&text).map_err(|source| ResolverError::MalformedReplaceFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Location of the sidecar file that applies to `layer_path`.
    pub fn sidecar_path_for(layer_path: &Path) -> PathBuf {
        let dir = layer_path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(tokens::REPLACE_FILE_NAME)
    }

    /// Read the sidecar file stored next to `layer_path`, if any.
    pub fn read_sidecar_for_layer(layer_path: &Path) -> Result<Self, ResolverError> {
        Self::read_sidecar(&Self::sidecar_path_for(layer_path))
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for ReplacePairs {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut pairs = Self::default();
        pairs.extend(iter);
        pairs
    }
}

impl<S: Into<String>, T: Into<String>> Extend<(S, T)> for ReplacePairs {
    fn extend<I: IntoIterator<Item = (S, T)>>(&mut self, iter: I) {
        for (source, target) in iter {
            self.add(source, target);
        }
    }
}
